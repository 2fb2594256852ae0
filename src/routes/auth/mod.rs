mod handler;
mod model;

pub use handler::{callback, me, sign_in, sign_out};
pub use model::{ProviderUser, UserInfo, consent_url};
