#![doc = "The `tasknest` library crate."]
#![doc = ""]
#![doc = "A small multi-tenant task-tracking backend. Users register, log in for an"]
#![doc = "opaque session token carried in an httpOnly cookie, and manage a personal"]
#![doc = "task list. Session *resolution* happens unconditionally in middleware;"]
#![doc = "*authorization* is decided per handler, so the two concerns never mix."]
#![doc = ""]
#![doc = "Handlers receive their collaborators by injection: the persistence port"]
#![doc = "(`repo::Repository`) and the runtime `config::Config` are attached as app"]
#![doc = "data by the binary (`main.rs`) or by the tests, which swap in the"]
#![doc = "in-memory repository."]

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod repo;
pub mod routes;
