//! 流描述、像素格式与帧缓冲类型
//!
//! - `PlaneView`：借用平面数据的只读视图
//! - `ConvertedFrame`：启动时一次性分配、每帧覆写的目标格式缓冲

use std::fmt;

use crate::error::{PlayerError, Result};

/// 目标帧的行对齐字节数
const STRIDE_ALIGN: usize = 32;

/// 流的媒体类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaType {
    /// 视频
    Video,
    /// 音频
    Audio,
    /// 字幕
    Subtitle,
    /// 数据流
    Data,
    /// 附件
    Attachment,
    /// 未知类型
    Unknown,
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Subtitle => "subtitle",
            Self::Data => "data",
            Self::Attachment => "attachment",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// 可上传到呈现端的像素格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// YUV 4:2:0 三平面（I420 排列）
    Yuv420p,
}

impl PixelFormat {
    /// 平面数量
    #[must_use]
    pub const fn plane_count(self) -> usize {
        match self {
            Self::Yuv420p => 3,
        }
    }

    /// 指定平面每行有效字节数与行数
    ///
    /// 平面索引越界时返回 `None`
    #[must_use]
    pub const fn plane_extent(self, plane: usize, width: u32, height: u32) -> Option<(usize, usize)> {
        let w = width as usize;
        let h = height as usize;
        match (self, plane) {
            (Self::Yuv420p, 0) => Some((w, h)),
            (Self::Yuv420p, 1 | 2) => Some((w.div_ceil(2), h.div_ceil(2))),
            _ => None,
        }
    }

    /// 格式名称（与 FFmpeg 命名一致）
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Yuv420p => "yuv420p",
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// YUV 数值范围
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorRange {
    /// 有限范围（Y 16..235）
    #[default]
    Limited,
    /// 完整范围（JPEG）
    Full,
}

/// 流描述：探测阶段一次性得到，打开解码器后以解码器参数为准
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamDescriptor {
    /// 容器中的流索引
    pub index: usize,
    /// 媒体类型
    pub media_type: MediaType,
    /// 编码名称
    pub codec: String,
    /// 画面宽度
    pub width: u32,
    /// 画面高度
    pub height: u32,
    /// 原生像素格式名称（非视频流或未能解析时为 `None`）
    pub format: Option<String>,
    /// YUV 数值范围
    pub range: ColorRange,
}

impl StreamDescriptor {
    /// 像素格式与尺寸是否均已确定
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        self.format.is_some() && self.width != 0 && self.height != 0
    }
}

impl fmt::Display for StreamDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {} {}", self.index, self.media_type, self.codec)?;
        if self.media_type == MediaType::Video {
            write!(f, " {}x{}", self.width, self.height)?;
            match &self.format {
                Some(format) => write!(f, " {format}")?,
                None => f.write_str(" ?")?,
            }
            if self.range == ColorRange::Full {
                f.write_str(" (full range)")?;
            }
        }
        Ok(())
    }
}

/// 单个平面的只读视图
#[derive(Debug, Clone, Copy)]
pub struct PlaneView<'a> {
    /// 平面数据（至少覆盖最后一行的有效字节）
    pub data: &'a [u8],
    /// 行间距（字节）
    pub stride: usize,
}

impl<'a> PlaneView<'a> {
    /// 取第 `y` 行的前 `len` 字节
    #[must_use]
    pub fn row(&self, y: usize, len: usize) -> Option<&'a [u8]> {
        let start = y.checked_mul(self.stride)?;
        self.data.get(start..start.checked_add(len)?)
    }
}

/// 目标格式的单个平面
#[derive(Debug, Clone, PartialEq, Eq)]
struct Plane {
    data: Vec<u8>,
    stride: usize,
    row_bytes: usize,
    rows: usize,
}

impl Plane {
    fn allocate(row_bytes: usize, rows: usize) -> Result<Self> {
        let stride = row_bytes.next_multiple_of(STRIDE_ALIGN);
        let len = stride
            .checked_mul(rows)
            .ok_or_else(|| PlayerError::Resource(format!("平面尺寸溢出: {stride}x{rows}")))?;
        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|e| PlayerError::Resource(format!("无法分配 {len} 字节帧缓冲: {e}")))?;
        data.resize(len, 0);
        Ok(Self {
            data,
            stride,
            row_bytes,
            rows,
        })
    }
}

/// 预分配的 YUV420P 目标帧
///
/// 尺寸在分配后固定，每帧由转换器原地覆写
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedFrame {
    width: u32,
    height: u32,
    range: ColorRange,
    planes: [Plane; 3],
}

impl ConvertedFrame {
    /// 目标像素格式
    pub const FORMAT: PixelFormat = PixelFormat::Yuv420p;

    /// 按固定尺寸分配目标帧
    ///
    /// # Errors
    ///
    /// - 尺寸为零时返回 `Conversion`
    /// - 内存分配失败时返回 `Resource`
    pub fn allocate(width: u32, height: u32, range: ColorRange) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(PlayerError::Conversion(format!(
                "目标帧尺寸无效: {width}x{height}"
            )));
        }
        let extent = |plane| {
            Self::FORMAT
                .plane_extent(plane, width, height)
                .ok_or(PlayerError::Lifecycle("目标格式平面索引越界"))
        };
        let (yw, yh) = extent(0)?;
        let (cw, ch) = extent(1)?;
        Ok(Self {
            width,
            height,
            range,
            planes: [
                Plane::allocate(yw, yh)?,
                Plane::allocate(cw, ch)?,
                Plane::allocate(cw, ch)?,
            ],
        })
    }

    /// 宽度
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// 高度
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// YUV 数值范围
    #[must_use]
    pub const fn range(&self) -> ColorRange {
        self.range
    }

    /// 指定平面的只读视图
    #[must_use]
    pub fn plane(&self, index: usize) -> Option<PlaneView<'_>> {
        self.planes.get(index).map(|p| PlaneView {
            data: &p.data,
            stride: p.stride,
        })
    }

    /// 把源平面逐行写入指定目标平面，只拷贝每行的有效字节
    ///
    /// # Errors
    ///
    /// - 平面索引越界、源行距小于行宽或源数据不足时返回 `Conversion`
    pub fn write_plane(&mut self, index: usize, src: PlaneView<'_>) -> Result<()> {
        let plane = self
            .planes
            .get_mut(index)
            .ok_or_else(|| PlayerError::Conversion(format!("目标平面索引越界: {index}")))?;
        let (row_bytes, rows) = (plane.row_bytes, plane.rows);
        if src.stride < row_bytes {
            return Err(PlayerError::Conversion(format!(
                "平面 {index} 行距 {} 小于行宽 {row_bytes}",
                src.stride
            )));
        }
        let needed = src.stride.saturating_mul(rows - 1).saturating_add(row_bytes);
        if src.data.len() < needed {
            return Err(PlayerError::Conversion(format!(
                "平面 {index} 数据不足: {} < {needed}",
                src.data.len()
            )));
        }
        for (dst, src) in plane
            .data
            .chunks_exact_mut(plane.stride)
            .zip(src.data.chunks(src.stride))
            .take(rows)
        {
            dst[..row_bytes].copy_from_slice(&src[..row_bytes]);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn odd_dimensions_round_chroma_up() {
        assert_eq!(PixelFormat::Yuv420p.plane_extent(0, 5, 3), Some((5, 3)));
        assert_eq!(PixelFormat::Yuv420p.plane_extent(1, 5, 3), Some((3, 2)));
        assert_eq!(PixelFormat::Yuv420p.plane_extent(2, 5, 3), Some((3, 2)));
        assert_eq!(PixelFormat::Yuv420p.plane_extent(3, 5, 3), None);
    }

    #[test]
    fn converted_frame_layout_is_aligned() {
        let frame = ConvertedFrame::allocate(33, 17, ColorRange::Limited).unwrap();
        let y = frame.plane(0).unwrap();
        let u = frame.plane(1).unwrap();
        assert_eq!(y.stride, 64);
        assert_eq!(y.data.len(), 64 * 17);
        assert_eq!(u.stride, 32);
        assert_eq!(u.data.len(), 32 * 9);
        assert!(frame.plane(3).is_none());
    }

    #[test]
    fn zero_sized_frame_is_rejected() {
        assert!(matches!(
            ConvertedFrame::allocate(0, 10, ColorRange::Limited),
            Err(PlayerError::Conversion(_))
        ));
    }

    #[test]
    fn plane_row_is_bounds_checked() {
        let data = [1u8, 2, 3, 4, 5, 6];
        let plane = PlaneView {
            data: &data,
            stride: 4,
        };
        assert_eq!(plane.row(1, 2), Some(&[5u8, 6][..]));
        assert_eq!(plane.row(1, 3), None);
    }

    #[test]
    fn descriptor_display_mentions_format() {
        let desc = StreamDescriptor {
            index: 0,
            media_type: MediaType::Video,
            codec: "h264".into(),
            width: 640,
            height: 360,
            format: Some("yuvj420p".into()),
            range: ColorRange::Full,
        };
        assert!(desc.is_resolved());
        assert_eq!(desc.to_string(), "#0 video h264 640x360 yuvj420p (full range)");
    }

    #[test]
    fn unresolved_descriptor_prints_placeholder() {
        let desc = StreamDescriptor {
            index: 1,
            media_type: MediaType::Video,
            codec: "hevc".into(),
            width: 0,
            height: 0,
            format: None,
            range: ColorRange::Limited,
        };
        assert!(!desc.is_resolved());
        assert_eq!(desc.to_string(), "#1 video hevc 0x0 ?");
    }

    #[test]
    fn write_plane_honors_source_stride() {
        let mut frame = ConvertedFrame::allocate(4, 2, ColorRange::Limited).unwrap();
        let luma = [1u8, 2, 3, 4, 0, 0, 5, 6, 7, 8];
        frame
            .write_plane(
                0,
                PlaneView {
                    data: &luma,
                    stride: 6,
                },
            )
            .unwrap();
        let y = frame.plane(0).unwrap();
        assert_eq!(y.row(0, 4), Some(&[1u8, 2, 3, 4][..]));
        assert_eq!(y.row(1, 4), Some(&[5u8, 6, 7, 8][..]));
    }

    #[test]
    fn write_plane_rejects_short_or_narrow_source() {
        let mut frame = ConvertedFrame::allocate(4, 2, ColorRange::Limited).unwrap();
        let short = [0u8; 7];
        let narrow = PlaneView {
            data: &short,
            stride: 3,
        };
        assert!(matches!(
            frame.write_plane(0, narrow),
            Err(PlayerError::Conversion(_))
        ));
        let short = PlaneView {
            data: &short,
            stride: 4,
        };
        assert!(matches!(
            frame.write_plane(0, short),
            Err(PlayerError::Conversion(_))
        ));
        let chroma = [9u8; 2];
        let chroma = PlaneView {
            data: &chroma,
            stride: 2,
        };
        assert!(matches!(
            frame.write_plane(3, chroma),
            Err(PlayerError::Conversion(_))
        ));
        frame.write_plane(2, chroma).unwrap();
        assert_eq!(frame.plane(2).unwrap().row(0, 2), Some(&[9u8, 9][..]));
        assert_eq!(frame.plane(0).unwrap().row(0, 4), Some(&[0u8; 4][..]));
    }
}
