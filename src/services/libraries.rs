//! Library lifecycle, membership and copy management

use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        book_info::AddCopyRequest,
        library::{CreateLibrary, Library, LibraryDetails, LibrarySummary, UpdateLibrary},
        user::{User, UserSummary},
    },
    repository::Repository,
};

use super::{catalog::CatalogService, geocoding::GeocodingService};

#[derive(Clone)]
pub struct LibrariesService {
    repository: Repository,
    catalog: CatalogService,
    geocoding: GeocodingService,
}

impl LibrariesService {
    pub fn new(repository: Repository, catalog: CatalogService, geocoding: GeocodingService) -> Self {
        Self {
            repository,
            catalog,
            geocoding,
        }
    }

    /// List all libraries
    pub async fn list(&self) -> AppResult<Vec<LibrarySummary>> {
        self.repository.libraries.list().await
    }

    /// Library with owner, members and copies
    pub async fn get_details(&self, id: Uuid) -> AppResult<LibraryDetails> {
        let library = self.repository.libraries.get_by_id(id).await?;
        self.details(library).await
    }

    /// Create a library owned (and joined) by `owner`
    pub async fn create(&self, request: CreateLibrary, owner: &User) -> AppResult<LibraryDetails> {
        let request = request.normalized();
        request.validate()?;

        let point = self.geocoding.locate(&request.location).await?;
        let library = self
            .repository
            .libraries
            .create(&request.name, &request.location, point, owner.id)
            .await?;

        tracing::info!(library_id = %library.id, owner_id = %owner.id, "Library created");
        self.details(library).await
    }

    /// Rename or move a library (owner only)
    pub async fn update(&self, id: Uuid, request: UpdateLibrary, actor: &User) -> AppResult<LibraryDetails> {
        let request = request.normalized();
        request.validate()?;

        let library = self.repository.libraries.get_by_id(id).await?;
        library.ensure_owner(actor.id)?;

        let name = request.name.as_deref();
        let location = match request.location.as_deref() {
            Some(text) if text != library.location => {
                Some((text, self.geocoding.locate(text).await?))
            }
            _ => None,
        };

        let library = self.repository.libraries.update(id, name, location).await?;
        tracing::info!(library_id = %library.id, "Library updated");
        self.details(library).await
    }

    /// Delete a library with its memberships and copies (owner only)
    pub async fn delete(&self, id: Uuid, actor: &User) -> AppResult<()> {
        let library = self.repository.libraries.get_by_id(id).await?;
        library.ensure_owner(actor.id)?;

        self.repository.libraries.delete(id).await?;
        tracing::info!(library_id = %id, "Library deleted");
        Ok(())
    }

    pub async fn members(&self, id: Uuid) -> AppResult<Vec<UserSummary>> {
        self.repository.libraries.get_by_id(id).await?;
        self.repository.libraries.members(id).await
    }

    /// Add a member. Returns false if the user already was one.
    pub async fn add_member(&self, library: &Library, user_id: Uuid) -> AppResult<bool> {
        self.repository.libraries.add_member(library.id, user_id).await
    }

    /// Remove a member. The owner always stays a member.
    pub async fn remove_member(&self, library: &Library, user_id: Uuid) -> AppResult<()> {
        if library.is_owned_by(user_id) {
            return Err(AppError::Forbidden(
                "The owner cannot leave their own library".to_string(),
            ));
        }
        if !self.repository.libraries.remove_member(library.id, user_id).await? {
            return Err(AppError::NotAMember);
        }
        Ok(())
    }

    /// Subscribe `user` to a library
    pub async fn join(&self, id: Uuid, user: &User) -> AppResult<LibraryDetails> {
        let library = self.repository.libraries.get_by_id(id).await?;
        if !self.add_member(&library, user.id).await? {
            return Err(AppError::AlreadyMember);
        }

        tracing::info!(library_id = %id, user_id = %user.id, "User joined library");
        self.details(library).await
    }

    /// Unsubscribe `user` from a library
    pub async fn leave(&self, id: Uuid, user: &User) -> AppResult<()> {
        let library = self.repository.libraries.get_by_id(id).await?;
        self.remove_member(&library, user.id).await?;

        tracing::info!(library_id = %id, user_id = %user.id, "User left library");
        Ok(())
    }

    /// Add a copy of a catalog book (owner only)
    pub async fn add_copy(&self, id: Uuid, request: AddCopyRequest, actor: &User) -> AppResult<LibraryDetails> {
        let library = self.repository.libraries.get_by_id(id).await?;
        library.ensure_owner(actor.id)?;
        request.validate()?;

        let info = self.catalog.resolve(&request.open_library_id).await?;
        let copy = self.repository.book_copies.create(library.id, info.id).await?;

        tracing::info!(
            library_id = %library.id,
            copy_id = %copy.id,
            open_library_id = %info.open_library_id,
            "Book copy added"
        );
        self.details(library).await
    }

    /// Remove a copy from a library (owner only)
    pub async fn remove_copy(&self, id: Uuid, copy_id: Uuid, actor: &User) -> AppResult<()> {
        let library = self.repository.libraries.get_by_id(id).await?;
        library.ensure_owner(actor.id)?;

        if !self
            .repository
            .book_copies
            .delete_from_library(library.id, copy_id)
            .await?
        {
            return Err(AppError::NotFound("Book copy not found in this library".to_string()));
        }

        tracing::info!(library_id = %library.id, %copy_id, "Book copy removed");
        Ok(())
    }

    async fn details(&self, library: Library) -> AppResult<LibraryDetails> {
        let members = self.repository.libraries.members(library.id).await?;
        let copies = self.repository.book_copies.list_for_library(library.id).await?;
        LibraryDetails::assemble(library, members, copies)
    }
}
