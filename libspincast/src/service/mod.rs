//! Service layer

pub mod publish;

pub use publish::PublishService;
