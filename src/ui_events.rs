/// Commands delivered to the app through the event-loop proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserCommand {
    StateInitialized, // Async GPU setup finished
    Shutdown,         // Stop the frame loop and release the canvas
}
