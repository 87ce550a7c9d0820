pub mod change_role_command;
pub mod create_user_command;
pub mod delete_user_command;
pub mod reset_password_command;
pub mod update_user_command;

pub use change_role_command::ChangeRoleCommand;
pub use create_user_command::CreateUserCommand;
pub use delete_user_command::DeleteUserCommand;
pub use reset_password_command::ResetPasswordCommand;
pub use update_user_command::UpdateUserCommand;
