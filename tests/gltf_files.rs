//! Loading real files through the parser boundary.

mod common;

use std::io::Cursor;
use std::path::Path;

use common::{init_logging, scratch_dir};
use glam::Vec4;
use model_import::texture::{FilterMode, MipmapFilterMode, WrapMode};
use model_import::{import, AlphaMode, ImportConfig, ImportError, Model};

fn png(image: image::DynamicImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

fn quad_buffer() -> Vec<u8> {
    let positions: [[f32; 3]; 4] = [
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [1.0, 1.0, 0.0],
        [0.0, 1.0, 0.0],
    ];
    let uvs: [[f32; 2]; 4] = [[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]];
    let indices: [u16; 6] = [0, 1, 2, 2, 3, 0];
    let mut bytes = Vec::new();
    bytes.extend_from_slice(bytemuck::cast_slice(&positions));
    bytes.extend_from_slice(bytemuck::cast_slice(&uvs));
    bytes.extend_from_slice(bytemuck::cast_slice(&indices));
    bytes
}

const QUAD_GLTF: &str = r#"{
  "asset": { "version": "2.0" },
  "scene": 0,
  "scenes": [{ "nodes": [0] }],
  "nodes": [
    { "name": "root", "mesh": 0, "translation": [1.0, 2.0, 3.0], "children": [1] },
    { "name": "child", "mesh": 0 }
  ],
  "meshes": [{
    "primitives": [{
      "attributes": { "POSITION": 0, "TEXCOORD_0": 1 },
      "indices": 2,
      "material": 0
    }]
  }],
  "materials": [{
    "name": "painted",
    "pbrMetallicRoughness": { "baseColorTexture": { "index": 0 }, "metallicFactor": 0.25 },
    "alphaMode": "MASK",
    "alphaCutoff": 0.3
  }],
  "textures": [{ "source": 0, "sampler": 0 }],
  "samplers": [{ "magFilter": 9728, "minFilter": 9987, "wrapS": 33071, "wrapT": 33648 }],
  "images": [{ "uri": "albedo.png" }],
  "accessors": [
    { "bufferView": 0, "componentType": 5126, "count": 4, "type": "VEC3",
      "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] },
    { "bufferView": 1, "componentType": 5126, "count": 4, "type": "VEC2" },
    { "bufferView": 2, "componentType": 5123, "count": 6, "type": "SCALAR" }
  ],
  "bufferViews": [
    { "buffer": 0, "byteOffset": 0, "byteLength": 48 },
    { "buffer": 0, "byteOffset": 48, "byteLength": 32 },
    { "buffer": 0, "byteOffset": 80, "byteLength": 12 }
  ],
  "buffers": [{ "uri": "quad.bin", "byteLength": 92 }]
}"#;

fn write_quad(dir: &Path) -> std::path::PathBuf {
    std::fs::write(dir.join("quad.bin"), quad_buffer()).unwrap();
    let albedo = image::RgbaImage::from_pixel(2, 2, image::Rgba([200, 100, 50, 255]));
    std::fs::write(dir.join("albedo.png"), png(albedo.into())).unwrap();
    let path = dir.join("quad.gltf");
    std::fs::write(&path, QUAD_GLTF).unwrap();
    path
}

#[test]
fn gltf_with_external_buffer_and_image() {
    init_logging();
    let dir = scratch_dir("external");
    let path = write_quad(&dir);

    let model = Model::load(&path).unwrap();
    assert_eq!(model.meshes.len(), 2);
    for mesh in &model.meshes {
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.indices, vec![0, 1, 2, 2, 3, 0]);
        assert_eq!(mesh.material, Some(0));
    }
    assert_eq!(model.meshes[0].origin.node, 0);
    assert_eq!(model.meshes[1].origin.node, 1);
    assert_eq!(model.meshes[0].vertices[2].uv, [1.0, 0.0]);

    assert_eq!(model.materials.len(), 1);
    let material = &model.materials[0];
    assert_eq!(material.name.as_deref(), Some("painted"));
    assert_eq!(material.alpha_mode, AlphaMode::Mask);
    assert_eq!(material.alpha_cutoff, 0.3);
    assert_eq!(material.metallic_factor, 0.25);

    let slot = material.base_color_texture.as_ref().unwrap();
    assert_eq!(slot.sampler.mag_filter, FilterMode::Nearest);
    assert_eq!(slot.sampler.min_filter, FilterMode::Linear);
    assert_eq!(slot.sampler.mipmap_filter, MipmapFilterMode::Linear);
    assert_eq!(slot.sampler.wrap_u, WrapMode::ClampToEdge);
    assert_eq!(slot.sampler.wrap_v, WrapMode::MirroredRepeat);
    assert_eq!((slot.texture.width, slot.texture.height), (2, 2));
    assert_eq!(slot.texture.channels, 4);
    assert_eq!(&slot.texture.pixels[..4], &[200, 100, 50, 255]);
    assert_eq!(slot.texture.name.as_deref(), Some("albedo.png"));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn parsed_document_keeps_node_transforms() {
    let dir = scratch_dir("transforms");
    let path = write_quad(&dir);

    let document = import::parse(&path).unwrap();
    assert_eq!(document.default_scene, Some(0));
    assert_eq!(document.nodes[0].children, vec![1]);
    assert_eq!(document.nodes[0].transform.w_axis, Vec4::new(1.0, 2.0, 3.0, 1.0));
    assert_eq!(document.nodes[1].transform, glam::Mat4::IDENTITY);
    assert_eq!(document.images[0].uri.as_deref(), Some("albedo.png"));

    std::fs::remove_dir_all(&dir).unwrap();
}

/// Packs a JSON chunk and a binary chunk into a GLB container.
fn glb(json: &str, bin: &[u8]) -> Vec<u8> {
    let mut json = json.as_bytes().to_vec();
    while json.len() % 4 != 0 {
        json.push(b' ');
    }
    let mut bin = bin.to_vec();
    while bin.len() % 4 != 0 {
        bin.push(0);
    }
    let total = 12 + 8 + json.len() + 8 + bin.len();

    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(b"glTF");
    out.extend_from_slice(&2u32.to_le_bytes());
    out.extend_from_slice(&(total as u32).to_le_bytes());
    out.extend_from_slice(&(json.len() as u32).to_le_bytes());
    out.extend_from_slice(b"JSON");
    out.extend_from_slice(&json);
    out.extend_from_slice(&(bin.len() as u32).to_le_bytes());
    out.extend_from_slice(b"BIN\0");
    out.extend_from_slice(&bin);
    out
}

#[test]
fn glb_with_embedded_rgb_image() {
    init_logging();
    let dir = scratch_dir("glb");

    let positions: [[f32; 3]; 3] = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
    let rgb = png(image::RgbImage::from_pixel(4, 2, image::Rgb([10, 20, 30])).into());
    let mut bin = bytemuck::cast_slice::<_, u8>(&positions).to_vec();
    bin.extend_from_slice(&rgb);

    let json = format!(
        r#"{{
  "asset": {{ "version": "2.0" }},
  "scenes": [{{ "nodes": [0] }}],
  "nodes": [{{ "mesh": 0 }}],
  "meshes": [{{ "primitives": [{{ "attributes": {{ "POSITION": 0 }}, "material": 0 }}] }}],
  "materials": [{{ "pbrMetallicRoughness": {{ "baseColorTexture": {{ "index": 0 }} }} }}],
  "textures": [{{ "source": 0 }}],
  "images": [{{ "bufferView": 1, "mimeType": "image/png" }}],
  "accessors": [{{ "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
                   "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] }}],
  "bufferViews": [
    {{ "buffer": 0, "byteOffset": 0, "byteLength": 36 }},
    {{ "buffer": 0, "byteOffset": 36, "byteLength": {png_len} }}
  ],
  "buffers": [{{ "byteLength": {bin_len} }}]
}}"#,
        png_len = rgb.len(),
        bin_len = bin.len()
    );
    let path = dir.join("triangle.glb");
    std::fs::write(&path, glb(&json, &bin)).unwrap();

    let kept = Model::load(&path).unwrap();
    let texture = &kept.textures[0];
    assert_eq!((texture.width, texture.height, texture.channels), (4, 2, 3));

    let config = ImportConfig {
        expand_rgb_to_rgba: true,
        ..Default::default()
    };
    let model = Model::load_with(&path, &config).unwrap();
    assert_eq!(model.meshes[0].indices, vec![0, 1, 2]);
    let texture = &model.textures[0];
    assert_eq!(texture.channels, 4);
    assert_eq!(&texture.pixels[..8], &[10, 20, 30, 255, 10, 20, 30, 255]);

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn missing_file_is_an_io_error_naming_the_path() {
    let err = Model::load("does/not/exist.gltf").unwrap_err();
    assert_eq!(err.path, Path::new("does/not/exist.gltf"));
    assert!(matches!(err.source, ImportError::Io(_)));
    assert!(err.to_string().contains("does/not/exist.gltf"));
}

#[test]
fn malformed_json_is_rejected_by_the_parser() {
    let dir = scratch_dir("malformed");
    let path = dir.join("broken.gltf");
    std::fs::write(&path, r#"{ "asset": { "version": "2.0" }, "nodes": [ "#).unwrap();

    let err = Model::load(&path).unwrap_err();
    assert!(matches!(err.source, ImportError::Gltf(_)));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn config_file_drives_the_load() {
    let dir = scratch_dir("config");
    let path = write_quad(&dir);
    let config_path = dir.join("import.json");
    std::fs::write(&config_path, r#"{ "scene": 3 }"#).unwrap();

    let config = ImportConfig::from_json_file(&config_path).unwrap();
    let err = Model::load_with(&path, &config).unwrap_err();
    assert!(matches!(
        err.source,
        ImportError::Reference { kind: model_import::TableKind::Scene, index: 3, len: 1 }
    ));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn percent_encoded_uris_resolve_to_files_with_spaces() {
    init_logging();
    let dir = scratch_dir("percent");
    std::fs::write(dir.join("my mesh.bin"), quad_buffer()).unwrap();
    let albedo = image::RgbaImage::from_pixel(1, 1, image::Rgba([1, 2, 3, 4]));
    std::fs::write(dir.join("my tex.png"), png(albedo.into())).unwrap();
    let json = QUAD_GLTF
        .replace("\"quad.bin\"", "\"my%20mesh.bin\"")
        .replace("\"albedo.png\"", "\"my%20tex.png\"");
    let path = dir.join("spaced.gltf");
    std::fs::write(&path, json).unwrap();

    let model = Model::load(&path).unwrap();
    assert_eq!(model.textures.len(), 1);
    assert_eq!(model.textures[0].pixels, vec![1, 2, 3, 4]);
    assert_eq!(model.textures[0].name.as_deref(), Some("my%20tex.png"));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn data_uri_image_is_decoded_on_demand() {
    init_logging();
    let dir = scratch_dir("data-uri");
    std::fs::write(dir.join("quad.bin"), quad_buffer()).unwrap();
    let albedo = image::RgbImage::from_pixel(3, 1, image::Rgb([9, 8, 7]));
    let uri = format!("data:image/png;base64,{}", base64::encode(png(albedo.into())));
    let json = QUAD_GLTF.replace("\"albedo.png\"", &format!("\"{}\"", uri));
    let path = dir.join("embedded.gltf");
    std::fs::write(&path, json).unwrap();

    let document = import::parse(&path).unwrap();
    assert!(document.images[0].uri.is_none());
    assert!(matches!(
        document.images[0].source,
        model_import::document::ImageSource::Encoded { .. }
    ));

    let model = Model::load(&path).unwrap();
    let texture = &model.textures[0];
    assert_eq!((texture.width, texture.height, texture.channels), (3, 1, 3));
    assert_eq!(&texture.pixels[..3], &[9, 8, 7]);

    std::fs::remove_dir_all(&dir).unwrap();
}
