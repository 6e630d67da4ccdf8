mod oauth_provider;
mod status;
mod user;

pub use oauth_provider::{NewUserOAuthProvider, OAuthProvider};
pub use status::OnlineStatus;
pub use user::{Credentials, NewUser, UNSET_PASSWORD, User, UserChange, UserChangeset};

#[cfg(test)]
pub(crate) use user::tests::sample_user;
