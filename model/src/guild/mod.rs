mod guild;
pub use guild::Guild;

mod role;
pub use role::Role;

mod member;
pub use member::Member;
