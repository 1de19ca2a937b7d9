pub mod path {
    pub use hikari_path::*;
}
pub mod handle {
    pub use hikari_handle::*;
}
pub mod asset {
    pub use hikari_asset::*;
}
