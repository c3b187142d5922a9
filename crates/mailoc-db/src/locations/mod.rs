//! Location records: row types, the attribute store, and read/write
//! operations over the `locations` tables.

pub mod meta;
mod read;
mod types;
mod write;

pub use read::{
    get_location_by_public_id, list_location_meta, list_location_terms, list_location_pins,
    list_locations,
};
pub use types::{LocationListingRow, LocationPinRow, LocationRow, MetaRow, NewLocation};
pub use write::{
    delete_location, find_location_id_by_meta, insert_location, update_location_coordinates,
};
