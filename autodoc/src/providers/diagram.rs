//! Diagram rasterization and area lists.

use anyhow::{anyhow, ensure};
use serde::{Deserialize, Serialize};

use super::DiagramNode;
use crate::core::SubjectType;

/// Width and height of a node icon in pixels.
pub const ICON_SIZE: u32 = 32;

/// Largest canvas, in pixels, a diagram may be drawn on.
pub const MAX_CANVAS_PIXELS: u64 = 64 * 1024 * 1024;

const MARGIN: u32 = 20;
const BORDER: u32 = 2;
const BACKGROUND: Rgba = Rgba([255, 255, 255, 255]);
const OUTLINE: Rgba = Rgba([48, 48, 48, 255]);

/// An RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba(pub [u8; 4]);

/// An 8-bit RGBA image held in memory, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl RasterImage {
    /// Creates an image filled with one color.
    #[must_use]
    pub fn filled(width: u32, height: u32, color: Rgba) -> Self {
        let count = width as usize * height as usize;
        let pixels = color.0.iter().copied().cycle().take(count * 4).collect();
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Wraps raw RGBA pixels. The buffer is not validated here: encoders
    /// reject buffers whose size does not match the dimensions, and pixel
    /// access treats missing bytes as outside the image.
    #[must_use]
    pub fn from_raw(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Image width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA bytes.
    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Returns the color at a pixel, if inside the image.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let bytes = self.pixels.get(offset..offset + 4)?;
        let mut color = [0; 4];
        color.copy_from_slice(bytes);
        Some(Rgba(color))
    }

    /// Fills a rectangle, clipped to the image bounds.
    pub fn fill_rect(&mut self, x: u32, y: u32, width: u32, height: u32, color: Rgba) {
        let x_end = x.saturating_add(width).min(self.width);
        let y_end = y.saturating_add(height).min(self.height);
        for row in y..y_end {
            for col in x..x_end {
                let offset = (row as usize * self.width as usize + col as usize) * 4;
                if let Some(bytes) = self.pixels.get_mut(offset..offset + 4) {
                    bytes.copy_from_slice(&color.0);
                }
            }
        }
    }
}

/// What a diagram area represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AreaType {
    /// The icon of a process step.
    StepIcon,
    /// The icon of a workflow entry.
    JobEntryIcon,
}

impl AreaType {
    const fn for_subject(subject_type: SubjectType) -> Self {
        match subject_type {
            SubjectType::Process => Self::StepIcon,
            SubjectType::Workflow => Self::JobEntryIcon,
        }
    }
}

/// A rectangle of the diagram image owned by one node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagramArea {
    /// What the area shows.
    pub area_type: AreaType,
    /// Left edge in image pixels.
    pub x: u32,
    /// Top edge in image pixels.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Name of the owning node.
    pub owner: String,
}

/// Computes node areas in image coordinates (node position plus margin).
///
/// Fails when a node lies so far out that its area cannot be addressed.
pub fn layout_areas(
    nodes: &[DiagramNode],
    subject_type: SubjectType,
) -> anyhow::Result<Vec<DiagramArea>> {
    let area_type = AreaType::for_subject(subject_type);
    nodes
        .iter()
        .map(|node| -> anyhow::Result<DiagramArea> {
            let offset = |coordinate: u32| {
                coordinate
                    .checked_add(MARGIN)
                    .filter(|start| start.checked_add(ICON_SIZE + MARGIN).is_some())
                    .ok_or_else(|| {
                        anyhow!(
                            "node '{}' at ({}, {}) is outside the drawable diagram",
                            node.name,
                            node.x,
                            node.y
                        )
                    })
            };
            Ok(DiagramArea {
                area_type,
                x: offset(node.x)?,
                y: offset(node.y)?,
                width: ICON_SIZE,
                height: ICON_SIZE,
                owner: node.name.clone(),
            })
        })
        .collect()
}

/// Draws the diagram: one outlined icon per node on a white canvas.
///
/// Fails when the canvas would exceed [`MAX_CANVAS_PIXELS`].
pub fn draw(nodes: &[DiagramNode], subject_type: SubjectType) -> anyhow::Result<RasterImage> {
    let areas = layout_areas(nodes, subject_type)?;
    // Area ends plus margin fit in u32, checked by layout_areas.
    let width = areas.iter().map(|a| a.x + a.width).max().unwrap_or(0) + MARGIN;
    let height = areas.iter().map(|a| a.y + a.height).max().unwrap_or(0) + MARGIN;
    let width = width.max(2 * MARGIN);
    let height = height.max(2 * MARGIN);
    ensure!(
        u64::from(width) * u64::from(height) <= MAX_CANVAS_PIXELS,
        "diagram canvas of {width}x{height} pixels exceeds the limit of {MAX_CANVAS_PIXELS} pixels"
    );

    let fill = match subject_type {
        SubjectType::Process => Rgba([66, 133, 244, 255]),
        SubjectType::Workflow => Rgba([244, 160, 0, 255]),
    };

    let mut image = RasterImage::filled(width, height, BACKGROUND);
    for area in &areas {
        image.fill_rect(area.x, area.y, area.width, area.height, OUTLINE);
        image.fill_rect(
            area.x + BORDER,
            area.y + BORDER,
            area.width - 2 * BORDER,
            area.height - 2 * BORDER,
            fill,
        );
    }
    Ok(image)
}
