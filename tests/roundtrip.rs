use gifstream::{CanvasAttributeFlags, ColorTable, Encoder, EncoderConfig, FrameInput};
use image::codecs::gif::GifDecoder;
use image::AnimationDecoder;

fn bw_palette() -> ColorTable {
    ColorTable::new(vec![[0, 0, 0], [255, 255, 255]]).unwrap()
}

fn decode_frames(bytes: &[u8]) -> Vec<image::Frame> {
    let decoder = GifDecoder::new(std::io::Cursor::new(bytes)).expect("valid gif");
    decoder.into_frames().collect_frames().expect("decodable frames")
}

#[test]
fn single_frame_round_trips_pixel_exact() {
    let config = EncoderConfig::new(2, 2).with_global_palette(bw_palette());
    let mut buf = Vec::new();
    let mut encoder = Encoder::new(config, &mut buf).unwrap();
    encoder.add_frame(FrameInput::new(vec![0, 1, 1, 0])).unwrap();
    encoder.close().unwrap();

    let frames = decode_frames(&buf);
    assert_eq!(frames.len(), 1);
    let rgba = frames[0].buffer();
    assert_eq!(rgba.dimensions(), (2, 2));
    let expected = [
        [0u8, 0, 0, 255],
        [255, 255, 255, 255],
        [255, 255, 255, 255],
        [0, 0, 0, 255],
    ];
    for (i, px) in rgba.pixels().enumerate() {
        assert_eq!(px.0, expected[i], "pixel {i} mismatch");
    }
}

#[test]
fn animated_sequence_with_diff_window_round_trips() {
    use gifstream::FrameGeneratorFlags;

    let config = EncoderConfig::new(2, 2)
        .with_global_palette(bw_palette())
        .with_attr_flags(CanvasAttributeFlags::IS_ANIMATED);
    let mut buf = Vec::new();
    let mut encoder = Encoder::new(config, &mut buf).unwrap();

    let mut first = FrameInput::new(vec![0, 1, 1, 0]);
    first.delay = 10;
    encoder.add_frame(first).unwrap();

    let mut second = FrameInput::new(vec![0, 1, 1, 1]);
    second.delay = 10;
    second.gen_flags = FrameGeneratorFlags::USE_DIFF_WINDOW;
    encoder.add_frame(second).unwrap();

    encoder.close().unwrap();

    let frames = decode_frames(&buf);
    assert_eq!(frames.len(), 2);
    let second_rgba = frames[1].buffer();
    // regardless of how little of the canvas the encoder actually rewrote,
    // a conformant decoder must reconstruct the full 2x2 frame.
    let expected: [[u8; 4]; 4] = [
        [0, 0, 0, 255],
        [255, 255, 255, 255],
        [255, 255, 255, 255],
        [255, 255, 255, 255],
    ];
    for (i, px) in second_rgba.pixels().enumerate() {
        assert_eq!(px.0, expected[i], "pixel {i} mismatch");
    }
}

#[test]
fn identical_frames_merge_delay() {
    let config = EncoderConfig::new(1, 1).with_global_palette(bw_palette());
    let mut buf = Vec::new();
    let mut encoder = Encoder::new(config, &mut buf).unwrap();

    let mut a = FrameInput::new(vec![0]);
    a.delay = 10;
    encoder.add_frame(a).unwrap();
    let mut b = FrameInput::new(vec![0]);
    b.delay = 20;
    encoder.add_frame(b).unwrap();
    encoder.close().unwrap();

    let frames = decode_frames(&buf);
    assert_eq!(frames.len(), 1);
    let (numer, denom) = frames[0].delay().numer_denom_ms();
    assert_eq!(numer / denom, 300); // 10cs + 20cs merged == 300ms
}

#[test]
fn close_without_any_frame_errors() {
    let config = EncoderConfig::new(1, 1).with_global_palette(bw_palette());
    let buf: Vec<u8> = Vec::new();
    let encoder = Encoder::new(config, buf).unwrap();
    assert!(encoder.close().is_err());
}

#[test]
fn file_backed_encoder_round_trips_via_tempfile() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.gif");

    let config = EncoderConfig::new(1, 1).with_global_palette(bw_palette());
    let mut encoder = Encoder::create(&path, config).unwrap();
    encoder.add_frame(FrameInput::new(vec![1])).unwrap();
    encoder.close().unwrap();

    let bytes = std::fs::read(&path).unwrap();
    let frames = decode_frames(&bytes);
    assert_eq!(frames.len(), 1);
}
