use std::path::{Component, Path, PathBuf};

use image::{DynamicImage, ImageBuffer, ImageReader, Rgba};
use livery_application::{ApplicationError, AssetDecoder, DecodedAsset};
use livery_domain::ImageRef;

use super::remote::HttpAssetFetcher;

pub const FALLBACK_WIDTH: u32 = 800;
pub const FALLBACK_HEIGHT: u32 = 600;
const FALLBACK_FILL: Rgba<u8> = Rgba([0xcc, 0xcc, 0xcc, 0xff]);
const FALLBACK_INK: Rgba<u8> = Rgba([0x96, 0x96, 0x96, 0xff]);

/// Resolves image references against a static asset directory. A leading
/// `/` means "asset root", as it does for a web server's static files.
/// `http(s)` references are downloaded instead.
#[derive(Debug)]
pub struct FsAssetDecoder {
    root: PathBuf,
    remote: HttpAssetFetcher,
}

impl FsAssetDecoder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            remote: HttpAssetFetcher::default(),
        }
    }

    pub fn with_fetcher(mut self, remote: HttpAssetFetcher) -> Self {
        self.remote = remote;
        self
    }

    /// Local file behind `image`. References with a URL scheme have none.
    pub fn resolve(&self, image: &ImageRef) -> Result<PathBuf, ApplicationError> {
        if image.as_str().contains("://") {
            return Err(ApplicationError::Unsupported(image.to_string()));
        }

        let relative = Path::new(image.as_str().trim().trim_start_matches('/'));
        if relative.as_os_str().is_empty() {
            return Err(ApplicationError::InvalidInput(
                "image reference must not be empty".to_string(),
            ));
        }
        if relative
            .components()
            .any(|component| !matches!(component, Component::Normal(_) | Component::CurDir))
        {
            return Err(ApplicationError::InvalidInput(format!(
                "image reference escapes the asset root: {image}"
            )));
        }

        Ok(self.root.join(relative))
    }
}

impl AssetDecoder for FsAssetDecoder {
    fn decode(&self, image: &ImageRef) -> Result<DecodedAsset, ApplicationError> {
        if image.is_fallback() {
            return Ok(placeholder(image));
        }
        if image.is_remote() {
            let bytes = self.remote.fetch(image.as_str())?;
            let decoded = image::load_from_memory(&bytes)
                .map_err(|error| ApplicationError::Decode(format!("{image}: {error}")))?;
            return Ok(into_asset(image, decoded));
        }

        let path = self.resolve(image)?;
        if !path.is_file() {
            return Err(ApplicationError::NotFound(format!(
                "asset file {:?}",
                path
            )));
        }

        let decoded = ImageReader::open(&path)
            .map_err(|error| ApplicationError::Io(error.to_string()))?
            .with_guessed_format()
            .map_err(|error| ApplicationError::Io(error.to_string()))?
            .decode()
            .map_err(|error| ApplicationError::Decode(format!("{:?}: {error}", path)))?;

        Ok(into_asset(image, decoded))
    }
}

fn into_asset(image: &ImageRef, decoded: DynamicImage) -> DecodedAsset {
    let rgba = decoded.to_rgba8();
    DecodedAsset {
        image: image.clone(),
        width: rgba.width(),
        height: rgba.height(),
        rgba: rgba.into_raw(),
    }
}

/// Flat grey card crossed by two diagonals.
fn placeholder(image: &ImageRef) -> DecodedAsset {
    let width = i64::from(FALLBACK_WIDTH);
    let height = i64::from(FALLBACK_HEIGHT);
    let stroke = 3 * width;

    let buffer = ImageBuffer::from_fn(FALLBACK_WIDTH, FALLBACK_HEIGHT, |x, y| {
        let (x, y) = (i64::from(x), i64::from(y));
        let falling = (x * height - y * width).abs() < stroke;
        let rising = ((width - 1 - x) * height - y * width).abs() < stroke;
        if falling || rising {
            FALLBACK_INK
        } else {
            FALLBACK_FILL
        }
    });

    DecodedAsset {
        image: image.clone(),
        width: FALLBACK_WIDTH,
        height: FALLBACK_HEIGHT,
        rgba: buffer.into_raw(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, ImageFormat, Rgb};
    use std::io::{Cursor, Read, Write};
    use std::net::TcpListener;
    use std::thread;
    use tempfile::TempDir;

    /// Answers a single HTTP request with `status` and `body`.
    fn serve_once(status: &'static str, body: Vec<u8>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("local addr");
        thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut request = [0_u8; 4096];
                let _ = stream.read(&mut request);
                let head = format!(
                    "HTTP/1.1 {status}\r\nContent-Type: image/png\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    body.len()
                );
                let _ = stream.write_all(head.as_bytes());
                let _ = stream.write_all(&body);
            }
        });
        format!("http://{addr}/verdeLuchador.png")
    }

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(ImageBuffer::from_pixel(width, height, Rgb([200_u8, 10, 10])))
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .expect("encode png");
        bytes
    }

    fn remote_decoder() -> FsAssetDecoder {
        FsAssetDecoder::new("does-not-exist").with_fetcher(HttpAssetFetcher::direct())
    }

    #[test]
    fn decodes_png_relative_to_root() {
        let dir = TempDir::new().expect("tempdir");
        let img = ImageBuffer::from_fn(40, 30, |_x, _y| Rgb([10_u8, 20_u8, 30_u8]));
        img.save(dir.path().join("car.png")).expect("save png");

        let decoder = FsAssetDecoder::new(dir.path());
        for reference in ["car.png", "/car.png"] {
            let asset = decoder
                .decode(&ImageRef::new(reference))
                .expect("png should decode");
            assert_eq!((asset.width, asset.height), (40, 30));
            assert_eq!(asset.rgba.len(), 40 * 30 * 4);
            assert_eq!(&asset.rgba[0..4], &[10, 20, 30, 255]);
        }
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = TempDir::new().expect("tempdir");
        let decoder = FsAssetDecoder::new(dir.path());
        let result = decoder.decode(&ImageRef::new("ghost.png"));
        assert!(matches!(result, Err(ApplicationError::NotFound(_))));
    }

    #[test]
    fn corrupt_file_is_a_decode_error() {
        let dir = TempDir::new().expect("tempdir");
        std::fs::write(dir.path().join("broken.png"), b"definitely not a png").expect("write");
        let decoder = FsAssetDecoder::new(dir.path());
        let result = decoder.decode(&ImageRef::new("broken.png"));
        assert!(matches!(
            result,
            Err(ApplicationError::Decode(_)) | Err(ApplicationError::Io(_))
        ));
    }

    #[test]
    fn url_reference_is_downloaded_and_decoded() {
        let url = serve_once("200 OK", png_bytes(12, 9));
        let asset = remote_decoder()
            .decode(&ImageRef::new(url.as_str()))
            .expect("remote png should decode");
        assert_eq!(asset.image, ImageRef::new(url.as_str()));
        assert_eq!((asset.width, asset.height), (12, 9));
        assert_eq!(&asset.rgba[0..4], &[200, 10, 10, 255]);
    }

    #[test]
    fn remote_failures_are_reported() {
        let missing = serve_once("404 Not Found", Vec::new());
        assert!(matches!(
            remote_decoder().decode(&ImageRef::new(missing.as_str())),
            Err(ApplicationError::NotFound(_))
        ));

        let garbage = serve_once("200 OK", b"not an image".to_vec());
        assert!(matches!(
            remote_decoder().decode(&ImageRef::new(garbage.as_str())),
            Err(ApplicationError::Decode(_))
        ));

        let closed = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = closed.local_addr().expect("local addr");
        drop(closed);
        assert!(matches!(
            remote_decoder().decode(&ImageRef::new(format!("http://{addr}/car.png"))),
            Err(ApplicationError::Io(_))
        ));
    }

    #[test]
    fn unknown_schemes_and_escaping_references_are_rejected() {
        let decoder = FsAssetDecoder::new("assets");
        assert!(matches!(
            decoder.decode(&ImageRef::new("ftp://example.com/car.png")),
            Err(ApplicationError::Unsupported(_))
        ));
        assert!(matches!(
            decoder.resolve(&ImageRef::new("../secret.png")),
            Err(ApplicationError::InvalidInput(_))
        ));
        assert_eq!(
            decoder
                .resolve(&ImageRef::new("/cars/red.png"))
                .expect("resolves"),
            Path::new("assets").join("cars/red.png")
        );
    }

    #[test]
    fn fallback_is_synthesized() {
        let decoder = FsAssetDecoder::new("does-not-exist");
        let asset = decoder
            .decode(&ImageRef::fallback())
            .expect("fallback never fails");
        assert_eq!((asset.width, asset.height), (FALLBACK_WIDTH, FALLBACK_HEIGHT));
        assert_eq!(&asset.rgba[0..4], &[0x96, 0x96, 0x96, 0xff]);
        let center_left = ((FALLBACK_HEIGHT / 2) * FALLBACK_WIDTH + 10) as usize * 4;
        assert_eq!(
            &asset.rgba[center_left..center_left + 4],
            &[0xcc, 0xcc, 0xcc, 0xff]
        );
    }
}
