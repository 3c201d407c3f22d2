mod login;
pub use login::Login;

mod register;
pub use register::Register;

mod feed;
pub use feed::Feed;

mod library;
pub use library::Library;

mod book_detail;
pub use book_detail::BookDetail;

mod friends;
pub use friends::Friends;

mod own_profile;
pub use own_profile::OwnProfile;

mod member_profile;
pub use member_profile::MemberProfile;

mod widgets;
