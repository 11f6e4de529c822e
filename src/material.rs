use std::sync::Arc;

use glam::{Vec3, Vec4};

use crate::document::{self, Document, TextureInfo};
use crate::error::{lookup, Result, TableKind};
use crate::render::Shader;
use crate::texture::{ImageDecoder, Sampler, Texture, TextureCache};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlphaMode {
    #[default]
    Opaque,
    Mask,
    Blend,
}

impl AlphaMode {
    /// Unknown names fall back to `Opaque`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "OPAQUE" => AlphaMode::Opaque,
            "MASK" => AlphaMode::Mask,
            "BLEND" => AlphaMode::Blend,
            other => {
                log::warn!("unknown alpha mode '{}', using OPAQUE", other);
                AlphaMode::Opaque
            }
        }
    }
}

/// A bound texture slot. The texture itself is shared with every other slot
/// that samples the same source image.
#[derive(Debug, Clone)]
pub struct TextureSlot {
    pub texture: Arc<Texture>,
    pub tex_coord: u32,
    pub sampler: Sampler,
}

#[derive(Debug, Clone)]
pub struct Material {
    pub name: Option<String>,
    pub base_color_factor: Vec4,
    pub metallic_factor: f32,
    pub roughness_factor: f32,
    pub emissive_factor: Vec3,
    pub normal_scale: f32,
    pub occlusion_strength: f32,
    pub alpha_mode: AlphaMode,
    pub alpha_cutoff: f32,
    pub double_sided: bool,

    pub base_color_texture: Option<TextureSlot>,
    pub metallic_roughness_texture: Option<TextureSlot>,
    pub normal_texture: Option<TextureSlot>,
    pub occlusion_texture: Option<TextureSlot>,
    pub emissive_texture: Option<TextureSlot>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: None,
            base_color_factor: Vec4::ONE,
            metallic_factor: 1.0,
            roughness_factor: 1.0,
            emissive_factor: Vec3::ZERO,
            normal_scale: 1.0,
            occlusion_strength: 1.0,
            alpha_mode: AlphaMode::Opaque,
            alpha_cutoff: 0.5,
            double_sided: false,
            base_color_texture: None,
            metallic_roughness_texture: None,
            normal_texture: None,
            occlusion_texture: None,
            emissive_texture: None,
        }
    }
}

impl Material {
    /// Slots in texture-unit order: base color, metallic-roughness, normal, occlusion, emissive.
    pub fn slots(&self) -> [Option<&TextureSlot>; 5] {
        [
            self.base_color_texture.as_ref(),
            self.metallic_roughness_texture.as_ref(),
            self.normal_texture.as_ref(),
            self.occlusion_texture.as_ref(),
            self.emissive_texture.as_ref(),
        ]
    }

    /// Sets the material uniforms and binds every present texture.
    pub fn apply<S: Shader + ?Sized>(&self, shader: &mut S) {
        shader.set_vec4("material.baseColor", self.base_color_factor);
        shader.set_float("material.metallic", self.metallic_factor);
        shader.set_float("material.roughness", self.roughness_factor);
        shader.set_vec3("material.emissiveFactor", self.emissive_factor);
        shader.set_float("material.normalScale", self.normal_scale);
        shader.set_float("material.occlusionStrength", self.occlusion_strength);
        shader.set_float("material.alphaCutoff", self.alpha_cutoff);
        shader.set_int(
            "material.alphaModeOpaque",
            (self.alpha_mode == AlphaMode::Opaque) as i32,
        );
        shader.set_int("material.alphaModeMask", (self.alpha_mode == AlphaMode::Mask) as i32);
        shader.set_int("material.alphaModeBlend", (self.alpha_mode == AlphaMode::Blend) as i32);

        const SLOT_NAMES: [(&str, &str); 5] = [
            ("material.hasBaseColorTexture", "material.baseColorTexture"),
            (
                "material.hasMetallicRoughnessTexture",
                "material.metallicRoughnessTexture",
            ),
            ("material.hasNormalTexture", "material.normalTexture"),
            ("material.hasOcclusionTexture", "material.occlusionTexture"),
            ("material.hasEmissiveTexture", "material.emissiveTexture"),
        ];
        for (unit, (slot, (has_name, sampler_name))) in
            self.slots().into_iter().zip(SLOT_NAMES).enumerate()
        {
            shader.set_int(has_name, slot.is_some() as i32);
            if let Some(slot) = slot {
                shader.bind_texture(unit as u32, &slot.texture, &slot.sampler);
                shader.set_int(sampler_name, unit as i32);
            }
        }
    }
}

/// Builds `Material`s from document records, decoding textures through a
/// per-load `TextureCache`.
pub struct MaterialResolver<'a> {
    document: &'a Document,
    decoder: &'a dyn ImageDecoder,
    expand_rgb_to_rgba: bool,
}

impl<'a> MaterialResolver<'a> {
    pub fn new(document: &'a Document, decoder: &'a dyn ImageDecoder) -> Self {
        Self {
            document,
            decoder,
            expand_rgb_to_rgba: false,
        }
    }

    pub fn expand_rgb_to_rgba(mut self, expand: bool) -> Self {
        self.expand_rgb_to_rgba = expand;
        self
    }

    fn resolve_slot(
        &self,
        info: Option<TextureInfo>,
        cache: &mut TextureCache,
    ) -> Result<Option<TextureSlot>> {
        let Some(info) = info else {
            return Ok(None);
        };
        let texture = lookup(&self.document.textures, TableKind::Texture, info.index)?;
        let sampler = match texture.sampler {
            Some(i) => *lookup(&self.document.samplers, TableKind::Sampler, i)?,
            None => Sampler::default(),
        };
        let texture =
            cache.get_or_decode(self.document, texture.source, self.decoder, self.expand_rgb_to_rgba)?;
        Ok(Some(TextureSlot {
            texture,
            tex_coord: info.tex_coord,
            sampler,
        }))
    }

    pub fn resolve(&self, material_index: usize, cache: &mut TextureCache) -> Result<Material> {
        let source: &document::Material =
            lookup(&self.document.materials, TableKind::Material, material_index)?;
        log::debug!(
            "resolving material {} ({})",
            material_index,
            source.name.as_deref().unwrap_or("unnamed")
        );

        Ok(Material {
            name: source.name.clone(),
            base_color_factor: Vec4::from_array(source.base_color_factor),
            metallic_factor: source.metallic_factor,
            roughness_factor: source.roughness_factor,
            emissive_factor: Vec3::from_array(source.emissive_factor),
            normal_scale: source.normal_scale,
            occlusion_strength: source.occlusion_strength,
            alpha_mode: AlphaMode::from_name(&source.alpha_mode),
            alpha_cutoff: source.alpha_cutoff.unwrap_or(0.5),
            double_sided: source.double_sided,
            base_color_texture: self.resolve_slot(source.base_color_texture, cache)?,
            metallic_roughness_texture: self
                .resolve_slot(source.metallic_roughness_texture, cache)?,
            normal_texture: self.resolve_slot(source.normal_texture, cache)?,
            occlusion_texture: self.resolve_slot(source.occlusion_texture, cache)?,
            emissive_texture: self.resolve_slot(source.emissive_texture, cache)?,
        })
    }
}
