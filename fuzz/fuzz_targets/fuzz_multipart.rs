//! Fuzz target: `MultipartPayload::assemble`
//!
//! Splits the input into caption and image bytes, assembles the upload
//! body and asserts exact byte accounting: the image appears verbatim, the
//! boundary never occurs inside a field, and the body closes correctly.
//!
//! cargo fuzz run fuzz_multipart

#![no_main]

use homewatch::relay::buffer::FetchedImage;
use homewatch::relay::multipart::MultipartPayload;
use libfuzzer_sys::fuzz_target;

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }
    let split = (data[0] as usize).min(data.len() - 1);
    let caption = String::from_utf8_lossy(&data[1..=split]).into_owned();
    let image = data[split + 1..].to_vec();
    if image.is_empty() {
        return;
    }
    let seed = u64::from(data[0]);

    let Ok(payload) = MultipartPayload::assemble("12345", &caption, FetchedImage::from_vec(image.clone()), seed) else {
        return;
    };
    let boundary = payload.boundary().as_bytes();
    assert!(!contains(&image, boundary), "boundary collides with image");
    assert!(!contains(caption.as_bytes(), boundary), "boundary collides with caption");

    let body = payload.as_bytes();
    assert!(contains(body, &image), "image bytes missing from body");
    let closing = format!("--{}--\r\n", payload.boundary());
    assert!(body.ends_with(closing.as_bytes()));
    assert!(body.len() > image.len() + caption.len());
});
