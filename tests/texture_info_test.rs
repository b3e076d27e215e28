use std::rc::Rc;

use gltf::json::texture::{MagFilter, MinFilter, WrappingMode};
use scene_facade::{Encoding, FacadeElement, MapSlot, MaterialTarget, TextureUsage};

use crate::common::test_utils::{BARE, PAINT_AND_GLASS, live_model};

mod common;

fn blank_image() -> image::DynamicImage {
    image::DynamicImage::new_rgba8(1, 1)
}

#[test]
fn encoding_follows_the_slot() {
    for usage in TextureUsage::ALL {
        let (mut model, _, _) = live_model(PAINT_AND_GLASS);
        let texture = model.create_texture("fresh", blank_image()).unwrap();
        let native = texture.native.clone().unwrap();

        model
            .material_mut(0)
            .unwrap()
            .texture_info_mut(usage)
            .set_texture(Some(texture));

        let expected = match usage {
            TextureUsage::Base | TextureUsage::Emissive => Encoding::ColorManaged,
            TextureUsage::Metallic | TextureUsage::Normal | TextureUsage::Occlusion => {
                Encoding::Linear
            }
        };
        assert_eq!(native.borrow().encoding(), expected, "{:?}", usage);
    }
}

#[test]
fn moving_a_texture_to_another_slot_re_tags_it() {
    let (mut model, _, _) = live_model(PAINT_AND_GLASS);
    let texture = model.create_texture("moving", blank_image()).unwrap();
    let native = texture.native.clone().unwrap();
    let paint = model.material_mut(0).unwrap();

    paint.normal_texture_mut().set_texture(Some(texture.clone()));
    assert_eq!(native.borrow().encoding(), Encoding::Linear);
    assert_eq!(
        native.borrow().encoding().texture_format(),
        wgpu::TextureFormat::Rgba8Unorm
    );

    paint.emissive_texture_mut().set_texture(Some(texture));
    assert_eq!(native.borrow().encoding(), Encoding::ColorManaged);
    assert_eq!(
        native.borrow().encoding().texture_format(),
        wgpu::TextureFormat::Rgba8UnormSrgb
    );
}

#[test]
fn textures_reach_every_instance_and_flag_it() {
    let (mut model, scene, counter) = live_model(PAINT_AND_GLASS);
    let texture = model.create_texture("glow", blank_image()).unwrap();
    let native = texture.native.clone().unwrap();
    let versions: Vec<u64> = scene
        .material_instances(0)
        .iter()
        .map(|instance| instance.borrow().version())
        .collect();
    let before = counter.count();

    model
        .material_mut(0)
        .unwrap()
        .emissive_texture_mut()
        .set_texture(Some(texture));

    for (instance, version) in scene.material_instances(0).iter().zip(versions) {
        let instance = instance.borrow();
        assert!(Rc::ptr_eq(&instance.map(MapSlot::Emissive).unwrap(), &native));
        assert!(instance.version() > version);
        assert!(instance.needs_update());
    }
    assert_eq!(counter.count(), before + 1);
}

#[test]
fn metallic_roughness_feeds_both_maps() {
    let (mut model, scene, _) = live_model(BARE);
    let texture = model.create_texture("orm", blank_image()).unwrap();
    let native = texture.native.clone().unwrap();

    model
        .material_mut(0)
        .unwrap()
        .pbr_metallic_roughness_mut()
        .metallic_roughness_texture_mut()
        .set_texture(Some(texture));

    let instance = scene.material_instances(0)[0].borrow();
    assert!(Rc::ptr_eq(&instance.map(MapSlot::Metalness).unwrap(), &native));
    assert!(Rc::ptr_eq(&instance.map(MapSlot::Roughness).unwrap(), &native));
    assert!(instance.map(MapSlot::Base).is_none());
}

#[test]
fn clearing_a_slot_is_safe_when_already_empty() {
    let (mut model, scene, counter) = live_model(PAINT_AND_GLASS);
    let paint = model.material_mut(0).unwrap();

    paint.normal_texture_mut().set_texture(None);
    paint.normal_texture_mut().set_texture(None);
    paint.emissive_texture_mut().set_texture(None);

    assert!(paint.normal_texture().texture().is_none());
    for instance in scene.material_instances(0) {
        let instance = instance.borrow();
        assert!(instance.map(MapSlot::Normal).is_none());
        assert!(instance.map(MapSlot::Emissive).is_none());
        // other slots keep their textures
        assert!(instance.map(MapSlot::Occlusion).is_some());
    }
    let document = model.document();
    let normal = document.materials[0].normal_texture.as_ref().unwrap();
    assert_eq!(normal.index, -1);
    assert_eq!(normal.scale, Some(0.5));
    assert!(document.materials[0].emissive_texture.is_none());
    assert_eq!(counter.count(), 3);
}

#[test]
fn document_textures_are_recorded_by_index() {
    let (mut model, scene, _) = live_model(BARE);
    let albedo = model.create_texture("albedo", blank_image()).unwrap();
    assert_eq!(albedo.index, Some(0));

    model
        .material_mut(0)
        .unwrap()
        .pbr_metallic_roughness_mut()
        .base_color_texture_mut()
        .set_texture(Some(albedo));

    let document = model.document();
    let pbr = document.materials[0].pbr_metallic_roughness.as_ref().unwrap();
    assert_eq!(pbr.base_color_texture.as_ref().unwrap().index, 0);
    assert_eq!(document.textures[0].source, Some(0));
    assert_eq!(document.images[0].mime_type.as_deref(), Some("image/png"));
    assert!(
        scene.material_instances(0)[0]
            .borrow()
            .map(MapSlot::Base)
            .is_some()
    );
}

#[test]
fn texture_views_keep_their_identity_when_re_pointed() {
    let (mut model, _, _) = live_model(PAINT_AND_GLASS);
    let packed = model.texture(1).unwrap();
    let base = model
        .material_mut(0)
        .unwrap()
        .pbr_metallic_roughness_mut()
        .base_color_texture_mut();

    let (texture_id, sampler_id, image_id) = {
        let texture = base.texture().unwrap();
        assert_eq!(texture.name().as_deref(), Some("albedo"));
        assert_eq!(texture.source().name().as_deref(), Some("albedo-image"));
        (texture.id(), texture.sampler().id(), texture.source().id())
    };

    base.set_texture(Some(packed));

    let texture = base.texture().unwrap();
    assert_eq!(texture.id(), texture_id);
    assert_eq!(texture.sampler().id(), sampler_id);
    assert_eq!(texture.source().id(), image_id);
    assert_eq!(texture.index(), Some(1));
    assert_eq!(texture.name().as_deref(), Some("packed"));
    assert_eq!(texture.source().uri().as_deref(), Some("packed.png"));
    assert_eq!(texture.sampler().index(), None);
}

#[test]
fn sampler_and_image_views_read_the_document() {
    let (model, _, _) = live_model(PAINT_AND_GLASS);
    let paint = model.material(0).unwrap();
    let texture = paint
        .pbr_metallic_roughness()
        .base_color_texture()
        .texture()
        .unwrap();

    let sampler = texture.sampler();
    assert_eq!(sampler.mag_filter(), Some(MagFilter::Nearest));
    assert_eq!(sampler.min_filter(), Some(MinFilter::LinearMipmapLinear));
    assert_eq!(sampler.wrap_s(), WrappingMode::ClampToEdge);
    assert_eq!(sampler.wrap_t(), WrappingMode::Repeat);
    let descriptor = sampler.descriptor();
    assert_eq!(descriptor.mag_filter, wgpu::FilterMode::Nearest);
    assert_eq!(descriptor.address_mode_u, wgpu::AddressMode::ClampToEdge);

    let image = texture.source();
    assert_eq!(image.uri().as_deref(), Some("albedo.png"));
    assert_eq!(image.mime_type(), None);
    assert_eq!(texture.to_json()["source"]["uri"], "albedo.png");
    assert_eq!(
        texture.source_object().unwrap()["sampler"],
        serde_json::json!(0)
    );

    // no sampler in the document: glTF defaults
    let packed = paint.normal_texture().texture().unwrap();
    assert_eq!(packed.sampler().mag_filter(), None);
    assert_eq!(packed.sampler().wrap_s(), WrappingMode::Repeat);
}
