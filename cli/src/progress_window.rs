use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

pub struct ProgressWindow {
    total_pb: ProgressBar,
    pass_pb: ProgressBar,

    total_len: usize,
    pass_len: usize,
    pass_num: u32,
}

impl ProgressWindow {
    pub fn new() -> Self {
        let multi_pb = MultiProgress::new();
        let sty = ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {percent}% {msg}")
            .progress_chars("##-");

        let total_pb = multi_pb.add(ProgressBar::new(100));
        total_pb.set_style(sty);

        let sty = ProgressStyle::default_bar()
            .template(" pass {msg:>3} {bar:40.cyan/blue} {percent}%")
            .progress_chars("##-");
        let pass_pb = multi_pb.add(ProgressBar::new(100));
        pass_pb.set_style(sty);

        std::thread::spawn(move || {
            let _ = multi_pb.join();
        });

        Self {
            total_pb,
            pass_pb,
            total_len: 100,
            pass_len: 100,
            pass_num: 0,
        }
    }
}

impl Drop for ProgressWindow {
    fn drop(&mut self) {
        self.total_pb.finish();
        self.pass_pb.finish();
    }
}

impl solid_synthesis::GeneratorProgress for ProgressWindow {
    fn update(&mut self, update: solid_synthesis::ProgressUpdate<'_>) {
        if update.total.total != self.total_len {
            self.total_len = update.total.total;
            self.total_pb.set_length(self.total_len as u64);
        }

        if update.pass.total != self.pass_len {
            self.pass_len = update.pass.total;
            self.pass_pb.set_length(self.pass_len as u64);
        }

        if update.pass_index + 1 != self.pass_num {
            self.pass_num = update.pass_index + 1;
            self.pass_pb.set_message(&self.pass_num.to_string());
        }

        if let Some(energy) = update.energy {
            self.total_pb.set_message(&format!("energy {}", energy));
        }

        self.total_pb.set_position(update.total.current as u64);
        self.pass_pb.set_position(update.pass.current as u64);
    }
}
