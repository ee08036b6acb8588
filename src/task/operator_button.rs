//! Operator Stop Button
//!
//! A short press raises the operator stop. The hunt notices it between
//! cycles, parks the robot and ends.

use bottle_toppler::system::operator::{request_stop, OPERATOR_STOP};
use defmt::info;
use embassy_rp::gpio::{Input, Level, Pull};
use embassy_time::{Duration, Timer};

use crate::task::resources::StopButtonResources;

/// Button debounce delay
const DEBOUNCE_DURATION: Duration = Duration::from_millis(30);

#[embassy_executor::task]
pub async fn operator_button(r: StopButtonResources) {
    let mut button = Input::new(r.pin, Pull::Down);
    loop {
        if debounce(&mut button).await != Level::High {
            continue;
        }
        info!("stop button pressed");
        request_stop(&OPERATOR_STOP);
    }
}

/// Ensures stable button state
async fn debounce(button: &mut Input<'static>) -> Level {
    loop {
        let st_level = button.get_level();
        button.wait_for_any_edge().await;
        Timer::after(DEBOUNCE_DURATION).await;
        let end_level = button.get_level();
        if st_level != end_level {
            break end_level;
        }
    }
}
