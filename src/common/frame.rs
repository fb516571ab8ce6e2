use chrono::{DateTime, Utc};
use image::DynamicImage;
use std::sync::Arc;
use uuid::Uuid;

/// A single captured video frame. Cloning shares the pixel buffer.
#[derive(Clone, Debug)]
pub struct Frame {
    frame_id: Uuid,
    index: u64,
    image: Arc<DynamicImage>,
    captured_at: DateTime<Utc>,
}

impl Frame {
    pub fn new(index: u64, image: DynamicImage, captured_at: DateTime<Utc>) -> Self {
        Self {
            frame_id: Uuid::new_v4(),
            index,
            image: Arc::new(image),
            captured_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.frame_id
    }

    /// Position of the frame within its source, starting at 0.
    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.image.width(), self.image.height())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    #[test]
    fn cloning_frame_shares_image_buffer() {
        let img: DynamicImage = DynamicImage::ImageRgb8(
            ImageBuffer::<Rgb<u8>, Vec<u8>>::from_pixel(16, 16, Rgb([1, 2, 3])),
        );
        let f1 = Frame::new(7, img, Utc::now());
        let f2 = f1.clone();
        assert!(Arc::ptr_eq(&f1.image, &f2.image));
        assert_eq!(f2.index(), 7);
        assert_eq!(f2.dimensions(), (16, 16));
    }
}
