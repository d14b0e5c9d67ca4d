pub mod model;
pub mod repository;
pub mod storage;
pub mod transport;
pub mod types;

pub use model::Model;
pub use repository::Repository;

#[derive(Clone)]
pub struct Environment {
    pub model: Model,
    pub repository: Repository,
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment").finish()
    }
}

impl Environment {
    pub fn new(model: Model, repository: Repository) -> Self {
        Self { model, repository }
    }

    /// Build the http backed environment from the loaded configuration
    pub fn from_repository(repository: Repository) -> Result<Self, String> {
        let model = Model::new(repository.config())?;
        Ok(Self::new(model, repository))
    }
}
