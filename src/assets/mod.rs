//! Asset IO, decoding and caching for the environment pipeline.

pub mod cache;
pub mod io;
pub mod loader;
pub mod texture;

use std::sync::OnceLock;
use tokio::runtime::Runtime;

pub use cache::{AsyncCache, Readiness};
pub use io::{AssetReader, AssetReaderVariant, FileAssetReader};
pub use loader::{
    CubeTextureLoader, DecodeRequest, DecoderKind, HdrLoader, LoaderExtensions, LoaderSettings,
    TextureDecoder,
};
pub use texture::{ColorSpace, EnvironmentMap, MipLevel, SourceTexture};

/// Runtime backing file IO, blocking decode work and background loads.
///
/// Loads can therefore be awaited from any executor (including
/// `pollster::block_on`), not only from inside a tokio context.
pub(crate) fn get_asset_runtime() -> &'static Runtime {
    static RUNTIME: OnceLock<Runtime> = OnceLock::new();
    RUNTIME.get_or_init(|| Runtime::new().expect("Failed to create asset loader runtime"))
}
