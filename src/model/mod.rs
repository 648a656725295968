pub mod attendance;
pub mod company;
pub mod declaration;
pub mod employee;
pub mod master;
pub mod role;
