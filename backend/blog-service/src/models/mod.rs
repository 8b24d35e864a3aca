pub mod identity;
pub mod role;
pub mod user;

pub use identity::AuthenticatedUser;
pub use role::Role;
pub use user::{
    CreateUserRequest, DeleteQuery, ListUsersQuery, LoginRequest, NewUser, ProfileResponse,
    RegisterRequest, SetRoleRequest, UpdateUserRequest, User, UserChanges, UserResponse,
};
