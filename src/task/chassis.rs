//! Chassis Actuators
//!
//! Implements the actuator driver on the robot's outputs:
//! - camera pan/tilt servos
//! - front steering servo and knock arm servo
//! - both rear motors through a TB6612FNG, always driven together
//!
//! Angles and power arrive already clamped by the actuation adapter.

use bottle_toppler::system::platform::ActuatorDriver;
use defmt::{info, warn};
use embassy_rp::gpio::{Level, Output};
use embassy_rp::pwm::{self, Pwm};
use tb6612fng::{DriveCommand, Motor, Tb6612fng};

use crate::task::resources::{CameraServoResources, ChassisServoResources, MotorDriverResources};
use crate::task::servo::{servo_config, ServoPair};

type DriveMotor = Motor<Output<'static>, Output<'static>, Pwm<'static>>;
type MotorDriver = Tb6612fng<
    Output<'static>,
    Output<'static>,
    Pwm<'static>,
    Output<'static>,
    Output<'static>,
    Pwm<'static>,
    Output<'static>,
>;

/// Motor PWM frequency; cheap DC motors run better at lower frequencies
const MOTOR_PWM_HZ: u32 = 10_000;

pub struct Chassis {
    camera: ServoPair,
    body: ServoPair,
    motors: MotorDriver,
}

impl Chassis {
    pub fn new(
        camera: CameraServoResources,
        body: ChassisServoResources,
        motors: MotorDriverResources,
    ) -> Self {
        let servo = servo_config();
        let camera = ServoPair::new(
            Pwm::new_output_ab(camera.slice, camera.pan_pin, camera.tilt_pin, servo.clone()),
            servo.clone(),
        );
        let body = ServoPair::new(
            Pwm::new_output_ab(body.slice, body.steering_pin, body.arm_pin, servo.clone()),
            servo,
        );

        // Calculate minimum divider needed to keep period under 16-bit limit
        let clock_freq_hz = embassy_rp::clocks::clk_sys_freq();
        let divider = ((clock_freq_hz / MOTOR_PWM_HZ) / 65535 + 1) as u8;
        let period = (clock_freq_hz / (MOTOR_PWM_HZ * divider as u32)) as u16 - 1;
        let mut pwm_config = pwm::Config::default();
        pwm_config.divider = divider.into();
        pwm_config.top = period;

        let left: DriveMotor = Motor::new(
            Output::new(motors.left_forward_pin, Level::Low),
            Output::new(motors.left_backward_pin, Level::Low),
            Pwm::new_output_a(motors.left_slice, motors.left_pwm_pin, pwm_config.clone()),
        )
        .unwrap();
        let right: DriveMotor = Motor::new(
            Output::new(motors.right_forward_pin, Level::Low),
            Output::new(motors.right_backward_pin, Level::Low),
            Pwm::new_output_a(motors.right_slice, motors.right_pwm_pin, pwm_config),
        )
        .unwrap();
        let stby = Output::new(motors.standby_pin, Level::Low);
        let mut motors = Tb6612fng::new(left, right, stby).unwrap();
        motors.disable_standby().unwrap();
        info!("chassis ready");

        Self {
            camera,
            body,
            motors,
        }
    }
}

impl ActuatorDriver for Chassis {
    fn set_cam_pan(&mut self, degrees: f32) {
        self.camera.set_a(degrees);
    }

    fn set_cam_tilt(&mut self, degrees: f32) {
        self.camera.set_b(degrees);
    }

    fn set_steering(&mut self, degrees: f32) {
        self.body.set_a(degrees);
    }

    fn set_arm(&mut self, degrees: f32) {
        self.body.set_b(degrees);
    }

    fn set_drive(&mut self, power: f32) {
        let speed = (libm::fabsf(power) * 100.0) as u8;
        let command = || match speed {
            0 => DriveCommand::Brake,
            _ if power > 0.0 => DriveCommand::Forward(speed),
            _ => DriveCommand::Backward(speed),
        };
        let left = self.motors.motor_a.drive(command());
        let right = self.motors.motor_b.drive(command());
        if left.is_err() || right.is_err() {
            warn!("motor driver rejected speed {}", speed);
        }
    }
}
