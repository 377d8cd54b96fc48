mod helpers;
mod jwt;
mod middleware;
mod password;

pub use jwt::{Claims, JwtKeys, TokenKind, TokenPair};
pub use middleware::{AuthError, RequireSuperadmin, RequireUser};
pub use password::{MIN_PASSWORD_LENGTH, PasswordManager};
