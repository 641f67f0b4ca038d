mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use appfaders_driver::testing::controller_with;
use appfaders_driver::{ClientId, DriverConfig, IoCycleInfo, IoOperation, ObjectId};

const DEVICE: ObjectId = ObjectId::DEVICE;

#[test]
fn test_render_while_control_churns() {
    common::init_logging();
    let config = DriverConfig::builder().gain_ramp_frames(64).max_clients(32).build();
    let (device, _host) = controller_with(config).unwrap();
    let device = Arc::new(device);

    device.add_client(DEVICE, ClientId(1), 100).unwrap();
    device.start_io(DEVICE, ClientId(1)).unwrap();

    let done = Arc::new(AtomicBool::new(false));
    let render = {
        let device = Arc::clone(&device);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            let mut buffer = vec![0.0f32; 256];
            let mut cycle = 0u64;
            while !done.load(Ordering::Acquire) || cycle < 100 {
                buffer.fill(1.0);
                #[allow(clippy::cast_precision_loss)]
                let info = IoCycleInfo::at(cycle, 128, (cycle * 128) as f64);
                device.do_io_operation(
                    DEVICE,
                    ObjectId::OUTPUT_STREAM,
                    ClientId(1),
                    IoOperation::ProcessOutput,
                    128,
                    &info,
                    &mut buffer,
                );
                for sample in &buffer {
                    assert!((0.0..=1.0).contains(sample), "out of range: {sample}");
                }
                let _ = device.zero_time_stamp(DEVICE).unwrap();
                cycle += 1;
            }
        })
    };

    // Gain changes for the rendering client, and slot churn around it
    for round in 0..2_000u32 {
        #[allow(clippy::cast_precision_loss)]
        let gain = (round % 5) as f32 / 4.0;
        device.set_client_gain(ClientId(1), gain).unwrap();

        let other = ClientId(1_000 + round % 8);
        if device.registry().contains(other) {
            device.remove_client(DEVICE, other).unwrap();
        } else {
            device.add_client(DEVICE, other, 200).unwrap();
        }
    }
    device.set_client_gain(ClientId(1), 0.5).unwrap();
    done.store(true, Ordering::Release);
    render.join().unwrap();

    // Stop settles the ramp on the last target
    device.stop_io(DEVICE, ClientId(1)).unwrap();
    assert_eq!(
        device.registry().gains().current_gain(ClientId(1)),
        0.5
    );
    assert_eq!(device.engine().diagnostics().total_faults(), 0);
}
