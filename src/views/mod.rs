mod dialog;
pub(crate) mod home;
