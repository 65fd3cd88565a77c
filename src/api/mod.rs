pub mod bulk_import;
pub mod leave_request;
pub mod staff;
