pub mod lifecycle_service;
pub mod notification_service;
pub mod reminder_service;
