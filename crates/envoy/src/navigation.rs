use courier_session::Navigator;

/// The terminal has no login screen; the entry surface is the `login` command.
pub struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn redirect_to_entry(&self) {
        eprintln!("Not signed in. Run `courier login --token <TOKEN>` first.");
    }
}
