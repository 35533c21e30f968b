use std::io::{ BufRead, Read, Write };

use prism_impl::image::Image;
use prism_impl::types::V3;

use crate::SceneError;

/// Writes the image as P3 ASCII PPM. Channels are clamped to [0, 1] and
/// scaled to [0, 255] with truncation toward zero.
pub fn write_ppm(image: &Image, out: &mut impl Write) -> Result<(), SceneError> {
    writeln!(out, "P3")?;
    writeln!(out, "{} {}", image.width, image.height)?;
    writeln!(out, "255")?;
    for y in 0..image.height {
        for x in 0..image.width {
            let c = image.pixel(x, y).clamp01();
            write!(out, "{} {} {} ", channel(c.x()), channel(c.y()), channel(c.z()))?;
        }
        writeln!(out)?;
    }
    Ok(())
}

fn channel(value: f64) -> u8 {
    (value * 255.0) as u8
}

/// Reads a P3 ASCII PPM into a linear image. `#` comments are stripped.
/// Sample values are scaled out of the 8-bit range.
pub fn load_ppm(mut reader: impl BufRead) -> Result<Image, SceneError> {
    let mut data = String::new();
    reader.read_to_string(&mut data)?;

    let mut tokens = data
        .lines()
        .map(|line| line.split('#').next().unwrap_or(""))
        .flat_map(str::split_whitespace);

    match tokens.next() {
        Some("P3") => {}
        other => return Err(SceneError::PpmFormat(format!("bad magic: {other:?}"))),
    }

    let width = next_value(&mut tokens, "width")?;
    let height = next_value(&mut tokens, "height")?;
    let max_value: i64 = next_value(&mut tokens, "max sample value")?;
    if width == 0 || height == 0 || max_value <= 0 {
        return Err(SceneError::PpmFormat(format!("bad dimensions {width}x{height}/{max_value}")));
    }

    let mut image = Image::new(width, height);
    for pixel in image.pixels.iter_mut() {
        let r: i64 = next_value(&mut tokens, "pixel data")?;
        let g: i64 = next_value(&mut tokens, "pixel data")?;
        let b: i64 = next_value(&mut tokens, "pixel data")?;
        *pixel = V3(r as f64 / 255.0, g as f64 / 255.0, b as f64 / 255.0);
    }

    Ok(image)
}

fn next_value<'a, T: std::str::FromStr>(
    tokens: &mut impl Iterator<Item = &'a str>,
    what: &str,
) -> Result<T, SceneError> {
    let token = tokens
        .next()
        .ok_or_else(|| SceneError::PpmFormat(format!("truncated file, missing {what}")))?;
    token
        .parse()
        .map_err(|_| SceneError::PpmFormat(format!("invalid {what}: {token:?}")))
}
