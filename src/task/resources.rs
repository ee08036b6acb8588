//! Hardware Resource Management
//!
//! Splits the RP2350 peripherals into one group per driver so every task
//! owns exactly the pins it drives.
//!
//! # Resource Groups
//! - Servos: camera pan/tilt and steering/arm, two hardware PWM slices
//! - Motor Driver: TB6612FNG, both rear motors driven together
//! - Ultrasonic: HC-SR04 forward ranger
//! - Grayscale: three floor-facing ADC channels
//! - Vision Link: UART0 to the camera/detector co-processor
//! - Music: UART1 to the DFPlayer module
//! - Stop Button: operator stop input

use assign_resources::assign_resources;
use embassy_rp::adc::InterruptHandler as AdcInterruptHandler;
use embassy_rp::bind_interrupts;
use embassy_rp::peripherals::{self, UART0, UART1};
use embassy_rp::uart::InterruptHandler as UartInterruptHandler;

assign_resources! {
    /// Camera pan (A) and tilt (B) servos
    camera_servos: CameraServoResources {
        slice: PWM_SLICE0,
        pan_pin: PIN_0,
        tilt_pin: PIN_1,
    },
    /// Steering (A) and knock arm (B) servos
    chassis_servos: ChassisServoResources {
        slice: PWM_SLICE1,
        steering_pin: PIN_2,
        arm_pin: PIN_3,
    },
    /// TB6612FNG dual motor driver pins and PWM channels
    motor_driver: MotorDriverResources {
        standby_pin: PIN_11,
        left_slice: PWM_SLICE2,
        left_pwm_pin: PIN_4,
        left_forward_pin: PIN_7,
        left_backward_pin: PIN_8,
        right_slice: PWM_SLICE3,
        right_pwm_pin: PIN_6,
        right_forward_pin: PIN_9,
        right_backward_pin: PIN_10,
    },
    /// HC-SR04 ultrasonic distance sensor pins
    ultrasonic: UltrasonicResources {
        trigger_pin: PIN_14,
        echo_pin: PIN_15,
    },
    /// Floor-facing grayscale sensors, left to right
    grayscale: GrayscaleResources {
        adc: ADC,
        left_pin: PIN_26,
        centre_pin: PIN_27,
        right_pin: PIN_28,
    },
    /// Camera and detector co-processor
    vision_link: VisionLinkResources {
        uart: UART0,
        tx_pin: PIN_16,
        rx_pin: PIN_17,
        tx_dma: DMA_CH0,
        rx_dma: DMA_CH1,
    },
    /// DFPlayer Mini MP3 module
    music: MusicResources {
        uart: UART1,
        tx_pin: PIN_20,
        rx_pin: PIN_21,
        tx_dma: DMA_CH2,
        rx_dma: DMA_CH3,
    },
    /// Operator stop push button
    stop_button: StopButtonResources {
        pin: PIN_22,
    },
}

bind_interrupts!(pub struct Irqs {
    ADC_IRQ_FIFO => AdcInterruptHandler;
    UART0_IRQ => UartInterruptHandler<UART0>;
    UART1_IRQ => UartInterruptHandler<UART1>;
});
