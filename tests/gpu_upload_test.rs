#[cfg(feature = "integration-tests")]
mod common;

#[cfg(feature = "integration-tests")]
fn device() -> Option<(wgpu::Device, wgpu::Queue)> {
    futures::executor::block_on(async {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..wgpu::InstanceDescriptor::new_without_display_handle()
        });
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions::default())
            .await
            .ok()?;
        adapter
            .request_device(&wgpu::DeviceDescriptor::default())
            .await
            .ok()
    })
}

#[test]
#[cfg(feature = "integration-tests")]
fn maps_upload_with_the_format_of_their_slot() {
    use scene_facade::{Encoding, TextureUsage};

    use crate::common::test_utils::{BARE, live_model};

    let Some((device, queue)) = device() else {
        log::warn!("No adapter available, skipping GPU upload test.");
        return;
    };
    let (mut model, scene, _) = live_model(BARE);
    let albedo = model.create_texture("albedo", image::DynamicImage::new_rgba8(4, 4)).unwrap();
    let normal = model.create_texture("normal", image::DynamicImage::new_rgba8(4, 4)).unwrap();
    let material = model.material_mut(0).unwrap();
    material
        .texture_info_mut(TextureUsage::Base)
        .set_texture(Some(albedo.clone()));
    material
        .texture_info_mut(TextureUsage::Normal)
        .set_texture(Some(normal.clone()));

    scene.prepare(&device, &queue).unwrap();

    let albedo = albedo.native.unwrap();
    let albedo = albedo.borrow();
    let gpu = albedo.gpu().unwrap();
    assert_eq!(gpu.encoding, Encoding::ColorManaged);
    assert_eq!(gpu.texture.format(), wgpu::TextureFormat::Rgba8UnormSrgb);

    let normal = normal.native.unwrap();
    let normal = normal.borrow();
    assert_eq!(
        normal.gpu().unwrap().texture.format(),
        wgpu::TextureFormat::Rgba8Unorm
    );
    assert!(!scene.material_instances(0)[0].borrow().needs_update());
}
