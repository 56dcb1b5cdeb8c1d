//! 媒体解码与像素格式转换

pub mod converter;
pub mod decoder;
#[cfg(feature = "ffmpeg")]
pub mod ffmpeg;
pub mod frame;

pub use converter::{FrameConverter, check_dimensions};
pub use decoder::{
    CodecState, DecodedFrame, DecoderSession, EncodedPacket, MediaSource, SourceOpener, probe,
};
pub use frame::{ColorRange, ConvertedFrame, MediaType, PixelFormat, PlaneView, StreamDescriptor};
