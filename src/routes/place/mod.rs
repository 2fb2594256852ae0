mod handler;
mod model;

pub use handler::{
    create_place, list_places, list_places_legacy, update_place, upload_image, vote_place,
};
pub use model::{Comment, CreatePlaceRequest, Place, UpdatePlaceRequest, VoteRequest};
