//! Basic lamco-frame usage example
//!
//! This example demonstrates the frame types of lamco-frame:
//! - PixelFormat layout helpers
//! - FormatConverter narrowing a 16-bit frame to 8 bits
//! - clone_frame and flip_vertical on a padded callback buffer
//!
//! Buffers are built in memory, no capture device is needed.

use lamco_frame::{clone_frame, flip_vertical, FormatConverter, FrameView, PixelFormat};

fn main() -> Result<(), lamco_frame::FrameError> {
    println!("lamco-frame v{}", lamco_frame::VERSION);
    println!();

    println!("Pixel formats (width 5):");
    for format in PixelFormat::ALL {
        println!(
            "  {:<9} tag {:#010x}, {:>2} bpp, stride {}",
            format.to_string(),
            format.tag(),
            format.bits_per_pixel(),
            format.aligned_stride(5)
        );
    }
    println!();

    // 3x2 Gray16 frame, samples 0x1234 then 0xABCD, rows padded to 8 bytes
    let gray16 = [
        0x34, 0x12, 0x34, 0x12, 0x34, 0x12, 0xEE, 0xEE, //
        0xCD, 0xAB, 0xCD, 0xAB, 0xCD, 0xAB, 0xEE, 0xEE,
    ];
    let view = FrameView::new(3, 2, 8, PixelFormat::Gray16, &gray16);

    let converter = FormatConverter::new();
    let gray8 = converter.convert(&view)?;
    println!("Converted {} -> {}:", view.format, gray8.format());
    println!("  Stride: {}", gray8.stride());
    println!("  Row 0: {:02x?}", gray8.row(0));
    println!("  Row 1: {:02x?}", gray8.row(1));
    println!("  Grayscale palette: {}", gray8.palette().is_some_and(|p| p.is_grayscale()));
    println!("  Bytes written: {}", converter.bytes_written());
    println!();

    let copy = clone_frame(&gray8.view())?;
    let flipped = flip_vertical(&gray8.view())?;
    println!("Clone row 0: {:02x?}", copy.row(0));
    println!("Flipped row 0: {:02x?}", flipped.row(0));

    Ok(())
}
