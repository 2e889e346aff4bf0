//! Desktop input backends.
//!
//! `SystemDesktop` talks to the operating system. On Windows pointer and
//! keyboard input go through `SendInput` / `SetCursorPos`; on other platforms
//! only application launch is available and input reports `Unsupported`.
//!
//! `HeadlessDesktop` records every call without side effects.

use crate::error::ActionError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl MouseButton {
    pub fn as_str(&self) -> &'static str {
        match self {
            MouseButton::Left => "left",
            MouseButton::Right => "right",
            MouseButton::Middle => "middle",
        }
    }
}

impl std::str::FromStr for MouseButton {
    type Err = ActionError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(MouseButton::Left),
            "right" => Ok(MouseButton::Right),
            "middle" => Ok(MouseButton::Middle),
            other => Err(ActionError::InvalidPayload(format!(
                "Unknown mouse button: {}",
                other
            ))),
        }
    }
}

/// OS input surface used by the action handlers.
#[async_trait]
pub trait Desktop: Send + Sync {
    /// Current screen size in pixels (width, height).
    fn screen_size(&self) -> (u32, u32);

    async fn launch(&self, program: &str) -> Result<(), ActionError>;

    async fn type_text(&self, text: &str) -> Result<(), ActionError>;

    async fn move_pointer(&self, x: i32, y: i32) -> Result<(), ActionError>;

    async fn click(&self, button: MouseButton, count: u32) -> Result<(), ActionError>;

    /// Positive deltas scroll up, negative scroll down.
    async fn scroll(&self, delta: i32) -> Result<(), ActionError>;

    async fn hotkey(&self, keys: &[String]) -> Result<(), ActionError>;
}

// =============================================================================
// System backend
// =============================================================================

/// Desktop backend that produces real OS effects.
pub struct SystemDesktop {
    fallback_size: (u32, u32),
    type_interval: Duration,
}

impl SystemDesktop {
    /// `fallback_size` is reported where the OS cannot be queried.
    pub fn new(fallback_size: (u32, u32), type_interval: Duration) -> Self {
        Self {
            fallback_size,
            type_interval,
        }
    }
}

#[async_trait]
impl Desktop for SystemDesktop {
    fn screen_size(&self) -> (u32, u32) {
        #[cfg(target_os = "windows")]
        {
            win32::screen_size().unwrap_or(self.fallback_size)
        }
        #[cfg(not(target_os = "windows"))]
        {
            self.fallback_size
        }
    }

    async fn launch(&self, program: &str) -> Result<(), ActionError> {
        std::process::Command::new(program)
            .spawn()
            .map(|child| {
                tracing::info!(program = %program, pid = child.id(), "Launched application");
            })
            .map_err(|e| ActionError::HandlerFailed(format!("Failed to launch {}: {}", program, e)))
    }

    #[cfg(target_os = "windows")]
    async fn type_text(&self, text: &str) -> Result<(), ActionError> {
        for ch in text.chars() {
            win32::type_char(ch)?;
            if !self.type_interval.is_zero() {
                tokio::time::sleep(self.type_interval).await;
            }
        }
        Ok(())
    }

    #[cfg(not(target_os = "windows"))]
    async fn type_text(&self, text: &str) -> Result<(), ActionError> {
        tracing::warn!(
            text_len = text.len(),
            interval_ms = self.type_interval.as_millis() as u64,
            "Keyboard input not available on this platform"
        );
        Err(unsupported("keyboard input"))
    }

    #[cfg(target_os = "windows")]
    async fn move_pointer(&self, x: i32, y: i32) -> Result<(), ActionError> {
        win32::move_pointer(x, y)
    }

    #[cfg(not(target_os = "windows"))]
    async fn move_pointer(&self, _x: i32, _y: i32) -> Result<(), ActionError> {
        Err(unsupported("pointer input"))
    }

    #[cfg(target_os = "windows")]
    async fn click(&self, button: MouseButton, count: u32) -> Result<(), ActionError> {
        for _ in 0..count {
            win32::click(button)?;
        }
        Ok(())
    }

    #[cfg(not(target_os = "windows"))]
    async fn click(&self, _button: MouseButton, _count: u32) -> Result<(), ActionError> {
        Err(unsupported("pointer input"))
    }

    #[cfg(target_os = "windows")]
    async fn scroll(&self, delta: i32) -> Result<(), ActionError> {
        win32::scroll(delta)
    }

    #[cfg(not(target_os = "windows"))]
    async fn scroll(&self, _delta: i32) -> Result<(), ActionError> {
        Err(unsupported("pointer input"))
    }

    #[cfg(target_os = "windows")]
    async fn hotkey(&self, keys: &[String]) -> Result<(), ActionError> {
        win32::hotkey(keys)
    }

    #[cfg(not(target_os = "windows"))]
    async fn hotkey(&self, _keys: &[String]) -> Result<(), ActionError> {
        Err(unsupported("keyboard input"))
    }
}

#[cfg(not(target_os = "windows"))]
fn unsupported(what: &str) -> ActionError {
    ActionError::Unsupported(format!("{} is only available on Windows", what))
}

#[cfg(target_os = "windows")]
mod win32 {
    use super::MouseButton;
    use crate::error::ActionError;
    use windows_sys::Win32::UI::Input::KeyboardAndMouse::{
        SendInput, INPUT, INPUT_0, INPUT_KEYBOARD, INPUT_MOUSE, KEYBDINPUT, KEYEVENTF_KEYUP,
        KEYEVENTF_UNICODE, MOUSEEVENTF_LEFTDOWN, MOUSEEVENTF_LEFTUP, MOUSEEVENTF_MIDDLEDOWN,
        MOUSEEVENTF_MIDDLEUP, MOUSEEVENTF_RIGHTDOWN, MOUSEEVENTF_RIGHTUP, MOUSEEVENTF_WHEEL,
        MOUSEINPUT, VK_BACK, VK_CONTROL, VK_DELETE, VK_ESCAPE, VK_LWIN, VK_MENU, VK_RETURN,
        VK_SHIFT, VK_SPACE, VK_TAB,
    };
    use windows_sys::Win32::UI::WindowsAndMessaging::{
        GetSystemMetrics, SetCursorPos, SM_CXSCREEN, SM_CYSCREEN,
    };

    pub fn screen_size() -> Option<(u32, u32)> {
        let (w, h) = unsafe { (GetSystemMetrics(SM_CXSCREEN), GetSystemMetrics(SM_CYSCREEN)) };
        if w > 0 && h > 0 {
            Some((w as u32, h as u32))
        } else {
            None
        }
    }

    pub fn move_pointer(x: i32, y: i32) -> Result<(), ActionError> {
        let ok = unsafe { SetCursorPos(x, y) };
        if ok == 0 {
            return Err(ActionError::HandlerFailed(format!(
                "SetCursorPos({}, {}) failed",
                x, y
            )));
        }
        Ok(())
    }

    pub fn type_char(ch: char) -> Result<(), ActionError> {
        let mut units = [0u16; 2];
        let mut inputs = Vec::new();
        for unit in ch.encode_utf16(&mut units).iter() {
            inputs.push(key_input(0, *unit, KEYEVENTF_UNICODE));
            inputs.push(key_input(0, *unit, KEYEVENTF_UNICODE | KEYEVENTF_KEYUP));
        }
        send(&inputs)
    }

    pub fn click(button: MouseButton) -> Result<(), ActionError> {
        let (down, up) = match button {
            MouseButton::Left => (MOUSEEVENTF_LEFTDOWN, MOUSEEVENTF_LEFTUP),
            MouseButton::Right => (MOUSEEVENTF_RIGHTDOWN, MOUSEEVENTF_RIGHTUP),
            MouseButton::Middle => (MOUSEEVENTF_MIDDLEDOWN, MOUSEEVENTF_MIDDLEUP),
        };
        send(&[mouse_input(down, 0), mouse_input(up, 0)])
    }

    pub fn scroll(delta: i32) -> Result<(), ActionError> {
        send(&[mouse_input(MOUSEEVENTF_WHEEL, delta)])
    }

    pub fn hotkey(keys: &[String]) -> Result<(), ActionError> {
        let codes = keys
            .iter()
            .map(|k| virtual_key(k))
            .collect::<Result<Vec<u16>, ActionError>>()?;

        let mut inputs: Vec<INPUT> = codes.iter().map(|vk| key_input(*vk, 0, 0)).collect();
        inputs.extend(codes.iter().rev().map(|vk| key_input(*vk, 0, KEYEVENTF_KEYUP)));
        send(&inputs)
    }

    fn virtual_key(name: &str) -> Result<u16, ActionError> {
        let lower = name.trim().to_ascii_lowercase();
        let vk = match lower.as_str() {
            "ctrl" | "control" => VK_CONTROL,
            "alt" => VK_MENU,
            "shift" => VK_SHIFT,
            "win" | "super" | "meta" => VK_LWIN,
            "tab" => VK_TAB,
            "enter" | "return" => VK_RETURN,
            "esc" | "escape" => VK_ESCAPE,
            "space" => VK_SPACE,
            "backspace" => VK_BACK,
            "delete" | "del" => VK_DELETE,
            single if single.len() == 1 => {
                let c = single.as_bytes()[0];
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_uppercase() as u16
                } else {
                    return Err(ActionError::InvalidPayload(format!("Unknown key: {}", name)));
                }
            }
            _ => return Err(ActionError::InvalidPayload(format!("Unknown key: {}", name))),
        };
        Ok(vk)
    }

    fn key_input(vk: u16, scan: u16, flags: u32) -> INPUT {
        INPUT {
            r#type: INPUT_KEYBOARD,
            Anonymous: INPUT_0 {
                ki: KEYBDINPUT {
                    wVk: vk,
                    wScan: scan,
                    dwFlags: flags,
                    time: 0,
                    dwExtraInfo: 0,
                },
            },
        }
    }

    fn mouse_input(flags: u32, data: i32) -> INPUT {
        INPUT {
            r#type: INPUT_MOUSE,
            Anonymous: INPUT_0 {
                mi: MOUSEINPUT {
                    dx: 0,
                    dy: 0,
                    mouseData: data,
                    dwFlags: flags,
                    time: 0,
                    dwExtraInfo: 0,
                },
            },
        }
    }

    fn send(inputs: &[INPUT]) -> Result<(), ActionError> {
        let sent = unsafe {
            SendInput(
                inputs.len() as u32,
                inputs.as_ptr(),
                std::mem::size_of::<INPUT>() as i32,
            )
        };
        if sent as usize != inputs.len() {
            return Err(ActionError::HandlerFailed(format!(
                "SendInput only sent {} of {} events",
                sent,
                inputs.len()
            )));
        }
        Ok(())
    }
}

// =============================================================================
// Headless backend
// =============================================================================

/// A call observed by [`HeadlessDesktop`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DesktopCall {
    Launch(String),
    TypeText(String),
    MovePointer(i32, i32),
    Click(MouseButton, u32),
    Scroll(i32),
    Hotkey(Vec<String>),
}

/// Records calls instead of touching the OS.
pub struct HeadlessDesktop {
    size: (u32, u32),
    calls: Mutex<Vec<DesktopCall>>,
}

impl HeadlessDesktop {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: (width, height),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every call recorded so far, oldest first.
    pub fn calls(&self) -> Vec<DesktopCall> {
        self.lock_calls().clone()
    }

    fn record(&self, call: DesktopCall) -> Result<(), ActionError> {
        tracing::debug!(call = ?call, "Headless desktop call");
        self.lock_calls().push(call);
        Ok(())
    }

    fn lock_calls(&self) -> std::sync::MutexGuard<'_, Vec<DesktopCall>> {
        self.calls.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for HeadlessDesktop {
    fn default() -> Self {
        Self::new(1920, 1080)
    }
}

#[async_trait]
impl Desktop for HeadlessDesktop {
    fn screen_size(&self) -> (u32, u32) {
        self.size
    }

    async fn launch(&self, program: &str) -> Result<(), ActionError> {
        self.record(DesktopCall::Launch(program.to_string()))
    }

    async fn type_text(&self, text: &str) -> Result<(), ActionError> {
        self.record(DesktopCall::TypeText(text.to_string()))
    }

    async fn move_pointer(&self, x: i32, y: i32) -> Result<(), ActionError> {
        self.record(DesktopCall::MovePointer(x, y))
    }

    async fn click(&self, button: MouseButton, count: u32) -> Result<(), ActionError> {
        self.record(DesktopCall::Click(button, count))
    }

    async fn scroll(&self, delta: i32) -> Result<(), ActionError> {
        self.record(DesktopCall::Scroll(delta))
    }

    async fn hotkey(&self, keys: &[String]) -> Result<(), ActionError> {
        self.record(DesktopCall::Hotkey(keys.to_vec()))
    }
}
