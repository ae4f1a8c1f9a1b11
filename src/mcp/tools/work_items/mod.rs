// Work Items module
pub mod create_work_item;
pub mod get_work_item;
pub mod list_work_items;
pub mod manage_work_item_link;
pub mod update_work_item;

// Re-export the public items
pub use create_work_item::{CreateWorkItemArgs, create_work_item};
pub use get_work_item::{GetWorkItemArgs, get_work_item};
pub use list_work_items::{ListWorkItemsArgs, list_work_items};
pub use manage_work_item_link::{LinkOperationArg, ManageWorkItemLinkArgs, manage_work_item_link};
pub use update_work_item::{UpdateWorkItemArgs, update_work_item};
