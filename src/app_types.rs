use polyevolve::fitness::MetricsSnapshot;

/// remembers the last uploaded generation so the viewer only re-uploads
/// the phenotype texture when a new one actually arrived
pub struct UploadGate {
    last_generation: Option<u64>,
}

impl UploadGate {
    pub fn new() -> Self {
        Self { last_generation: None }
    }

    pub fn should_upload(&mut self, generation: u64) -> bool {
        if self.last_generation == Some(generation) {
            return false;
        }
        self.last_generation = Some(generation);
        true
    }
}

/// latest numbers shown in the status bar
#[derive(Clone, Copy, Debug, Default)]
pub struct StatusLine {
    pub generation: u64,
    pub best_fitness: f64,
    pub worst_fitness: f64,
    pub metrics: MetricsSnapshot,
    pub finished: bool,
}
