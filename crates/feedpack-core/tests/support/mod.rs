#![allow(dead_code)]

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use feedpack_core::frontend::{CommandRunner, CommandStatus};

pub fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create_dir_all should succeed in test temp dirs");
    }
    fs::write(path, content).expect("write should succeed in test temp dirs");
}

pub fn read(path: &Path) -> String {
    fs::read_to_string(path).expect("read_to_string should succeed")
}

/// Lay out a backend tree resembling the feeder firmware sources.
pub fn make_backend(root: &Path) -> PathBuf {
    let backend = root.join("backend");
    write_file(&backend.join("main.py"), "import scheduler_service\n");
    write_file(&backend.join("api.py"), "from microdot import Microdot\n");
    write_file(&backend.join("config.py"), "SERVO_PIN = 4\n");
    write_file(&backend.join("boot.py"), "import wifi_manager\n");
    write_file(&backend.join("microdot.py"), "class Microdot: pass\n");
    write_file(&backend.join("microdot_asyncio.py"), "import microdot\n");
    write_file(&backend.join("microdot_notes.txt"), "not a source file\n");
    write_file(&backend.join("wifi.dat"), "ssid;secret\n");
    write_file(&backend.join("build.js"), "// legacy build script\n");
    write_file(&backend.join("package.json"), "{}\n");

    write_file(&backend.join("api_old.py"), "# old\n");
    write_file(&backend.join("test_gpio.py"), "# gpio test\n");
    write_file(&backend.join("test_servo.py"), "# servo test\n");
    write_file(&backend.join("test_scheduler.py"), "# scheduler test\n");

    write_file(&backend.join("lib").join("stepper.py"), "class Stepper: pass\n");
    write_file(&backend.join("lib").join("rtc_handler.py"), "class Rtc: pass\n");
    write_file(&backend.join("lib").join("notification.py"), "def send(): pass\n");
    write_file(&backend.join("lib").join("test_servo.py"), "# nested excluded\n");
    write_file(&backend.join("lib").join("README.md"), "drivers\n");

    write_file(&backend.join("ota").join("ota_updater.py"), "class OTA: pass\n");
    write_file(&backend.join("ota").join("version.json"), "{\"version\": \"1.2.0\"}\n");
    write_file(&backend.join("ota").join("CHANGELOG.md"), "# Changes\n");
    write_file(&backend.join("ota").join("firmware.bin"), "\u{0}\u{1}\n");
    write_file(&backend.join("ota").join("nested").join("meta.json"), "{}\n");

    write_file(&backend.join("__pycache__").join("main.cpython.pyc"), "bytecode");
    write_file(&backend.join("__pycache__").join("cached.py"), "# cached\n");
    write_file(&backend.join("node_modules").join("pkg").join("index.py"), "# vendored\n");
    write_file(&backend.join("dist").join("stale.py"), "# previous build\n");

    backend
}

/// Lay out a UI project next to the backend.
pub fn make_frontend(root: &Path) -> PathBuf {
    let frontend = root.join("frontend");
    write_file(&frontend.join("package.json"), "{\"scripts\": {\"build\": \"vite build\"}}\n");
    write_file(&frontend.join("src").join("app.js"), "checkConnection();\n");
    frontend
}

/// Stand-in for `npm run build` that writes a dist tree into the project.
pub struct FakeFrontendBuild {
    pub exit_code: i32,
    pub calls: RefCell<Vec<(String, Vec<String>, PathBuf)>>,
}

impl FakeFrontendBuild {
    pub fn succeeding() -> Self {
        Self {
            exit_code: 0,
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn failing(code: i32) -> Self {
        Self {
            exit_code: code,
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl CommandRunner for FakeFrontendBuild {
    fn run(&self, program: &str, args: &[String], cwd: &Path) -> anyhow::Result<CommandStatus> {
        self.calls
            .borrow_mut()
            .push((program.to_string(), args.to_vec(), cwd.to_path_buf()));
        if self.exit_code != 0 {
            return Ok(CommandStatus::failure(self.exit_code));
        }
        let dist = cwd.join("dist");
        write_file(&dist.join("index.html"), "<html>feeder</html>\n");
        write_file(&dist.join("calibration.html"), "<html>calibration</html>\n");
        write_file(&dist.join("css").join("styles.css"), "body { margin: 0 }\n");
        write_file(&dist.join("js").join("app.js"), "checkConnection();\n");
        Ok(CommandStatus::success())
    }
}

/// Relative paths of every file under `root`, sorted.
pub fn list_files(root: &Path) -> Vec<String> {
    let mut out = Vec::new();
    collect(root, root, &mut out);
    out.sort();
    out
}

fn collect(root: &Path, dir: &Path, out: &mut Vec<String>) {
    for entry in fs::read_dir(dir).expect("read_dir should succeed") {
        let path = entry.expect("dir entry should be readable").path();
        if path.is_dir() {
            collect(root, &path, out);
        } else {
            let rel = path
                .strip_prefix(root)
                .expect("path should be under root")
                .to_string_lossy()
                .replace('\\', "/");
            out.push(rel);
        }
    }
}
