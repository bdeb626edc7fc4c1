pub mod applications;
pub mod chat;
pub mod jobs;
pub mod notifications;
pub mod offers;
