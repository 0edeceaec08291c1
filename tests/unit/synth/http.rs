use super::*;

use base64::Engine as _;

fn tiny_png_b64() -> String {
    let png = PixelBuffer::solid(2, 2, [10, 20, 30, 255])
        .unwrap()
        .encode_png()
        .unwrap();
    BASE64.encode(png)
}

#[test]
fn decodes_plain_payload() {
    let img = decode_image_payload(&tiny_png_b64()).unwrap();
    assert_eq!((img.width, img.height), (2, 2));
    assert_eq!(&img.data[..4], &[10, 20, 30, 255]);
}

#[test]
fn decodes_data_url_payload() {
    let payload = format!("data:image/png;base64,{}", tiny_png_b64());
    let img = decode_image_payload(&payload).unwrap();
    assert_eq!((img.width, img.height), (2, 2));
}

#[test]
fn rejects_garbage_payload() {
    let err = decode_image_payload("not base64 at all!").unwrap_err();
    assert!(matches!(err, ReelError::Synthesis(_)));
}

#[test]
fn endpoint_is_normalized() {
    let s = HttpSynthesizer::new("http://localhost:7860/", Duration::from_secs(5)).unwrap();
    assert_eq!(s.endpoint(), "http://localhost:7860");
}

#[test]
fn empty_endpoint_is_rejected() {
    assert!(HttpSynthesizer::new("", Duration::from_secs(5)).is_err());
}

#[test]
fn img2img_body_carries_seed_and_strength() {
    let body = Img2ImgBody {
        init_images: vec!["abc".to_string()],
        denoising_strength: 0.65,
        prompt: "a fox",
        seed: 42,
        steps: 20,
        cfg_scale: 7.0,
        width: 64,
        height: 64,
        batch_size: 1,
        n_iter: 1,
    };
    let v = serde_json::to_value(&body).unwrap();
    assert_eq!(v["seed"], 42);
    assert_eq!(v["denoising_strength"], 0.65);
    assert_eq!(v["init_images"][0], "abc");
}
