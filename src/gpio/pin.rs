//! Pin export, direction setup and level I/O

use super::{Direction, PinLevel, PinNumber, PinState, SYSFS_GPIO_ROOT};
use crate::error::{IoResultExt, NodectlError, Result};
use crate::sysfs::{ControlSurface, SysfsSurface};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Creates configured pins on one GPIO control root
#[derive(Clone)]
pub struct GpioController {
    surface: Arc<dyn ControlSurface>,
    root: PathBuf,
}

impl fmt::Debug for GpioController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GpioController").field("root", &self.root).finish()
    }
}

impl GpioController {
    /// Create a controller over `surface` rooted at `root`
    pub fn new(surface: Arc<dyn ControlSurface>, root: impl Into<PathBuf>) -> Self {
        Self {
            surface,
            root: root.into(),
        }
    }

    /// Controller for the kernel's real GPIO interface
    pub fn sysfs() -> Self {
        Self::new(Arc::new(SysfsSurface::new()), SYSFS_GPIO_ROOT)
    }

    /// GPIO control root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Export `number` if needed and configure it as an output
    pub fn output_pin(&self, number: PinNumber) -> Result<OutputPin> {
        self.setup(number, Direction::Out).map(|pin| OutputPin { pin })
    }

    /// Export `number` if needed and configure it as an input
    pub fn input_pin(&self, number: PinNumber) -> Result<InputPin> {
        self.setup(number, Direction::In).map(|pin| InputPin { pin })
    }

    /// Report the lifecycle state of `number` without changing it
    pub fn state(&self, number: PinNumber) -> Result<PinState> {
        let dir = self.pin_dir(number);
        if !self.surface.exists(&dir).with_path(&dir)? {
            return Ok(PinState::Unexported);
        }

        let direction_path = dir.join("direction");
        let direction = match self.surface.read(&direction_path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(PinState::ExportedUnconfigured)
            }
            Err(e) => return Err(NodectlError::io(direction_path, e)),
        };

        Ok(match direction.trim() {
            "in" => PinState::Input,
            "out" => PinState::Output,
            _ => PinState::ExportedUnconfigured,
        })
    }

    fn pin_dir(&self, number: PinNumber) -> PathBuf {
        self.root.join(format!("gpio{}", number))
    }

    fn setup(&self, number: PinNumber, direction: Direction) -> Result<Pin> {
        let setup_error = |source: NodectlError| NodectlError::Setup {
            pin: number,
            direction,
            source: Box::new(source),
        };

        let pin = Pin {
            number,
            dir: self.pin_dir(number),
            surface: Arc::clone(&self.surface),
        };

        // An existing directory means an earlier run exported and configured
        // the line. Its direction is trusted, not re-checked.
        let exported = self
            .surface
            .exists(&pin.dir)
            .with_path(&pin.dir)
            .map_err(setup_error)?;
        if exported {
            tracing::debug!("GPIO pin {} already exported, skipping setup", number);
            return Ok(pin);
        }

        let export_path = self.root.join("export");
        tracing::debug!("Exporting GPIO pin {} via {:?}", number, export_path);
        self.surface
            .write(&export_path, &format!("{}\n", number))
            .with_path(&export_path)
            .map_err(setup_error)?;

        let direction_path = pin.dir.join("direction");
        tracing::debug!("Setting GPIO pin {} direction to {}", number, direction.as_str());
        self.surface
            .write(&direction_path, direction.as_str())
            .with_path(&direction_path)
            .map_err(setup_error)?;

        Ok(pin)
    }
}

struct Pin {
    number: PinNumber,
    dir: PathBuf,
    surface: Arc<dyn ControlSurface>,
}

impl Pin {
    fn value_path(&self) -> PathBuf {
        self.dir.join("value")
    }
}

impl fmt::Debug for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pin")
            .field("number", &self.number)
            .field("dir", &self.dir)
            .finish()
    }
}

/// A line configured as output. It can only be driven, never read.
#[derive(Debug)]
pub struct OutputPin {
    pin: Pin,
}

impl OutputPin {
    /// GPIO line number
    pub fn number(&self) -> PinNumber {
        self.pin.number
    }

    /// Drive the line high
    pub fn set_high(&self) -> Result<()> {
        self.set_level(PinLevel::High)
    }

    /// Drive the line low
    pub fn set_low(&self) -> Result<()> {
        self.set_level(PinLevel::Low)
    }

    /// Drive the line to `level`
    pub fn set_level(&self, level: PinLevel) -> Result<()> {
        tracing::debug!("Setting GPIO pin {} {}", self.pin.number, level);
        self.pin
            .surface
            .write(&self.pin.value_path(), level.as_value())
            .map_err(|source| NodectlError::Write {
                pin: self.pin.number,
                level,
                source,
            })
    }
}

/// A line configured as input. It can only be read, never driven.
///
/// ```compile_fail
/// use nodectl::gpio::InputPin;
///
/// fn drive(pin: &InputPin) {
///     pin.set_high().unwrap();
/// }
/// ```
#[derive(Debug)]
pub struct InputPin {
    pin: Pin,
}

impl InputPin {
    /// GPIO line number
    pub fn number(&self) -> PinNumber {
        self.pin.number
    }

    /// Read the line; always 0 or 1
    pub fn value(&self) -> Result<u8> {
        let path = self.pin.value_path();
        let contents = self.pin.surface.read(&path).with_path(&path)?;

        let value: i64 = contents
            .trim()
            .parse()
            .map_err(|source| NodectlError::Parse {
                path: path.clone(),
                contents: contents.clone(),
                source,
            })?;

        match value {
            0 => Ok(0),
            1 => Ok(1),
            value => Err(NodectlError::InvariantViolation { path, value }),
        }
    }

    /// Read the line as a [`PinLevel`]
    pub fn level(&self) -> Result<PinLevel> {
        Ok(if self.value()? == 1 {
            PinLevel::High
        } else {
            PinLevel::Low
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sysfs::MemorySurface;
    use proptest::prelude::*;
    use std::io::ErrorKind;
    use tempfile::TempDir;

    const ROOT: &str = "/sys/class/gpio";

    fn memory_controller() -> (Arc<MemorySurface>, GpioController) {
        let surface = Arc::new(MemorySurface::new());
        surface.add_file(format!("{}/export", ROOT), "");
        let controller = GpioController::new(surface.clone(), ROOT);
        (surface, controller)
    }

    #[test]
    fn test_output_pin_setup_exports_and_sets_direction() {
        let (surface, controller) = memory_controller();

        let pin = controller.output_pin(508).unwrap();

        assert_eq!(pin.number(), 508);
        assert_eq!(
            surface.writes(),
            vec![
                (PathBuf::from("/sys/class/gpio/export"), "508\n".to_string()),
                (PathBuf::from("/sys/class/gpio/gpio508/direction"), "out".to_string()),
            ]
        );
        assert_eq!(controller.state(508).unwrap(), PinState::Output);
    }

    #[test]
    fn test_input_pin_direction() {
        let (surface, controller) = memory_controller();

        controller.input_pin(503).unwrap();

        assert_eq!(surface.contents("/sys/class/gpio/gpio503/direction").unwrap(), "in");
        assert_eq!(controller.state(503).unwrap(), PinState::Input);
    }

    #[test]
    fn test_setup_twice_exports_once() {
        let (surface, controller) = memory_controller();

        controller.output_pin(500).unwrap();
        controller.output_pin(500).unwrap();

        assert_eq!(surface.write_count("/sys/class/gpio/export"), 1);
        assert_eq!(surface.write_count("/sys/class/gpio/gpio500/direction"), 1);
    }

    #[test]
    fn test_export_failure_is_setup_error() {
        let (surface, controller) = memory_controller();
        surface.fail_on("/sys/class/gpio/export", ErrorKind::PermissionDenied);

        let err = controller.output_pin(508).unwrap_err();

        assert!(matches!(err, NodectlError::Setup { pin: 508, direction: Direction::Out, .. }));
        assert!(matches!(err.root_cause(), NodectlError::Io { .. }));
        assert!(err.is_permission_error());
    }

    #[test]
    fn test_direction_failure_is_setup_error() {
        let (surface, controller) = memory_controller();
        surface.fail_on("/sys/class/gpio/gpio503/direction", ErrorKind::Other);

        let err = controller.input_pin(503).unwrap_err();
        assert!(matches!(err, NodectlError::Setup { pin: 503, direction: Direction::In, .. }));
    }

    #[test]
    fn test_existence_check_failure_is_setup_error() {
        let (surface, controller) = memory_controller();
        surface.fail_on("/sys/class/gpio/gpio508", ErrorKind::PermissionDenied);

        let err = controller.output_pin(508).unwrap_err();

        assert!(matches!(err, NodectlError::Setup { .. }));
        assert!(surface.writes().is_empty());
    }

    #[test]
    fn test_set_levels() {
        let (surface, controller) = memory_controller();
        let pin = controller.output_pin(508).unwrap();

        pin.set_high().unwrap();
        assert_eq!(surface.contents("/sys/class/gpio/gpio508/value").unwrap(), "1\n");
        pin.set_low().unwrap();
        assert_eq!(surface.contents("/sys/class/gpio/gpio508/value").unwrap(), "0\n");
    }

    #[test]
    fn test_write_failure_carries_pin_and_level() {
        let (surface, controller) = memory_controller();
        let pin = controller.output_pin(508).unwrap();
        surface.fail_on("/sys/class/gpio/gpio508/value", ErrorKind::Other);

        let err = pin.set_high().unwrap_err();
        assert!(matches!(err, NodectlError::Write { pin: 508, level: PinLevel::High, .. }));
    }

    #[test]
    fn test_read_value_with_trailing_newline() {
        let (surface, controller) = memory_controller();
        let pin = controller.input_pin(503).unwrap();

        surface.add_file("/sys/class/gpio/gpio503/value", "1\n");
        assert_eq!(pin.value().unwrap(), 1);
        assert_eq!(pin.level().unwrap(), PinLevel::High);

        surface.add_file("/sys/class/gpio/gpio503/value", "0\n");
        assert_eq!(pin.value().unwrap(), 0);
    }

    #[test]
    fn test_value_out_of_range_is_invariant_violation() {
        let (surface, controller) = memory_controller();
        let pin = controller.input_pin(503).unwrap();
        surface.add_file("/sys/class/gpio/gpio503/value", "2");

        let err = pin.value().unwrap_err();
        assert!(matches!(err, NodectlError::InvariantViolation { value: 2, .. }));
    }

    #[test]
    fn test_value_not_integer_is_parse_error() {
        let (surface, controller) = memory_controller();
        let pin = controller.input_pin(503).unwrap();
        surface.add_file("/sys/class/gpio/gpio503/value", "high");

        assert!(matches!(pin.value().unwrap_err(), NodectlError::Parse { .. }));
    }

    #[test]
    fn test_state_unexported_and_unconfigured() {
        let (surface, controller) = memory_controller();
        assert_eq!(controller.state(42).unwrap(), PinState::Unexported);

        surface.add_dir("/sys/class/gpio/gpio42");
        assert_eq!(controller.state(42).unwrap(), PinState::ExportedUnconfigured);
    }

    #[test]
    fn test_sysfs_already_exported_pin() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("gpio508")).unwrap();
        std::fs::write(dir.path().join("gpio508/direction"), "out\n").unwrap();
        std::fs::write(dir.path().join("gpio508/value"), "0\n").unwrap();

        let controller = GpioController::new(Arc::new(SysfsSurface::new()), dir.path());
        let pin = controller.output_pin(508).unwrap();
        pin.set_high().unwrap();

        // export was never touched
        assert!(!dir.path().join("export").exists());
        assert_eq!(
            std::fs::read_to_string(dir.path().join("gpio508/value")).unwrap(),
            "1\n"
        );
        assert_eq!(controller.state(508).unwrap(), PinState::Output);
    }

    #[test]
    fn test_sysfs_export_without_kernel_fails() {
        // With no kernel behind the directory, the export write lands but
        // gpio<N>/ never appears, so the direction write fails.
        let dir = TempDir::new().unwrap();
        let controller = GpioController::new(Arc::new(SysfsSurface::new()), dir.path());

        let err = controller.input_pin(503).unwrap_err();

        assert!(matches!(err, NodectlError::Setup { pin: 503, .. }));
        assert_eq!(std::fs::read_to_string(dir.path().join("export")).unwrap(), "503\n");
    }

    proptest! {
        #[test]
        fn prop_setup_is_idempotent(number in 0u32..4096, repeats in 1usize..5) {
            let (surface, controller) = memory_controller();
            for _ in 0..repeats {
                controller.output_pin(number).unwrap();
            }
            prop_assert_eq!(surface.write_count("/sys/class/gpio/export"), 1);
        }
    }
}
