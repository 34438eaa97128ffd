#[cfg(test)]
pub mod mocks {
    use crate::claude::{AgentRunner, ClaudeReply, Invocation, KillSignal, RunError};
    use crate::telegram::{Notifier, TelegramError};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// What the next scripted run does.
    pub enum Script {
        Reply(String),
        Fail { code: i32, stderr: String },
        /// Blocks until the kill signal fires.
        Hold,
    }

    impl Script {
        pub fn reply(stdout: &str) -> Self {
            Script::Reply(stdout.to_string())
        }

        pub fn fail(code: i32, stderr: &str) -> Self {
            Script::Fail {
                code,
                stderr: stderr.to_string(),
            }
        }
    }

    pub struct ScriptedRunner {
        scripts: Mutex<VecDeque<Script>>,
        invocations: Mutex<Vec<Invocation>>,
        kills: Mutex<usize>,
    }

    impl ScriptedRunner {
        pub fn new(scripts: Vec<Script>) -> Self {
            Self {
                scripts: Mutex::new(scripts.into()),
                invocations: Mutex::new(Vec::new()),
                kills: Mutex::new(0),
            }
        }

        pub fn invocations(&self) -> Vec<Invocation> {
            self.invocations.lock().unwrap().clone()
        }

        pub fn kills(&self) -> usize {
            *self.kills.lock().unwrap()
        }
    }

    #[async_trait]
    impl AgentRunner for ScriptedRunner {
        async fn run(&self, invocation: Invocation, kill: KillSignal) -> Result<ClaudeReply, RunError> {
            self.invocations.lock().unwrap().push(invocation);
            let script = self
                .scripts
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Script::reply("{}"));

            match script {
                Script::Reply(stdout) => Ok(ClaudeReply::parse(&stdout)),
                Script::Fail { code, stderr } => Err(RunError::NonZeroExit {
                    code: Some(code),
                    stderr,
                }),
                Script::Hold => {
                    let _ = kill.await;
                    *self.kills.lock().unwrap() += 1;
                    Err(RunError::Killed)
                }
            }
        }
    }

    pub struct RecordingNotifier {
        messages: Mutex<Vec<String>>,
        should_fail: bool,
    }

    impl RecordingNotifier {
        pub fn new() -> Self {
            Self {
                messages: Mutex::new(Vec::new()),
                should_fail: false,
            }
        }

        /// Records every message, then reports a delivery error.
        pub fn failing() -> Self {
            Self {
                messages: Mutex::new(Vec::new()),
                should_fail: true,
            }
        }

        pub fn messages(&self) -> Vec<String> {
            self.messages.lock().unwrap().clone()
        }

        pub fn last(&self) -> Option<String> {
            self.messages.lock().unwrap().last().cloned()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, text: &str) -> Result<(), TelegramError> {
            self.messages.lock().unwrap().push(text.to_string());
            if self.should_fail {
                return Err(TelegramError::Api {
                    code: Some(403),
                    description: "Forbidden: bot was blocked by the user".to_string(),
                });
            }
            Ok(())
        }
    }
}
