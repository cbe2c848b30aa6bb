pub mod friendship {
    pub mod schema;
    pub mod model;
    pub mod repository;
    pub mod repository_pg;
    pub mod repository_memory;
    pub mod service;
    pub mod access;
    pub mod handle;
    pub mod route;
}
