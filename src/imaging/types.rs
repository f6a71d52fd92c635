use image::metadata::Orientation;
use image::DynamicImage;

/// A decoded still image owned by one pipeline invocation
///
/// Carries the orientation the source asked for until [`orient`] bakes it
/// into the pixels; after that the orientation is always
/// [`Orientation::NoTransforms`].
///
/// [`orient`]: crate::imaging::orient
#[derive(Clone, Debug)]
pub struct Picture {
    image: DynamicImage,
    orientation: Orientation,
}

impl Picture {
    /// Wrap pixels that are already upright
    pub fn new(image: DynamicImage) -> Self {
        Self {
            image,
            orientation: Orientation::NoTransforms,
        }
    }

    /// Wrap pixels that still need `orientation` applied
    pub fn with_orientation(image: DynamicImage, orientation: Orientation) -> Self {
        Self { image, orientation }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// (width, height)
    pub fn dimensions(&self) -> (u32, u32) {
        (self.image.width(), self.image.height())
    }

    /// Orientation still pending on the pixels
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Whether the pixels are stored upright
    pub fn is_upright(&self) -> bool {
        self.orientation == Orientation::NoTransforms
    }

    pub fn has_alpha(&self) -> bool {
        self.image.color().has_alpha()
    }

    pub fn as_image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn into_parts(self) -> (DynamicImage, Orientation) {
        (self.image, self.orientation)
    }
}
