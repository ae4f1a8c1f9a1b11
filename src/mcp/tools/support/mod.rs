// Support module for shared utility functions
mod deserialize_non_empty_string;
mod simplify_work_item_json;
mod to_mcp_error;
mod work_items_to_csv;

pub use deserialize_non_empty_string::{
    deserialize_non_empty_string, deserialize_optional_non_empty_string,
};
pub use simplify_work_item_json::simplify_work_item_json;
pub use to_mcp_error::{json_result, to_mcp_error};
pub use work_items_to_csv::work_items_to_csv;
