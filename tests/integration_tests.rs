//! End-to-end CLI tests for the `ralph` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn ralph() -> Command {
    Command::cargo_bin("ralph").unwrap()
}

fn temp_project() -> TempDir {
    TempDir::new().unwrap()
}

fn init_project(dir: &TempDir) {
    ralph().current_dir(dir.path()).arg("init").assert().success();
}

mod cli_basics {
    use super::*;

    #[test]
    fn help_succeeds() {
        ralph().arg("--help").assert().success();
    }

    #[test]
    fn version_succeeds() {
        ralph().arg("--version").assert().success();
    }

    #[test]
    fn init_creates_ralph_dir_and_config() {
        let dir = temp_project();

        ralph()
            .current_dir(dir.path())
            .arg("init")
            .assert()
            .success()
            .stdout(predicate::str::contains("Initialized Ralph"));

        assert!(dir.path().join(".ralph").is_dir());
        assert!(dir.path().join(".ralph/config.yaml").is_file());
    }

    #[test]
    fn init_without_force_refuses_reinit() {
        let dir = temp_project();
        init_project(&dir);

        ralph()
            .current_dir(dir.path())
            .arg("init")
            .assert()
            .failure()
            .code(2);
    }

    #[test]
    fn init_with_force_reinitializes() {
        let dir = temp_project();
        init_project(&dir);

        ralph()
            .current_dir(dir.path())
            .args(["init", "--force"])
            .assert()
            .success();
    }

    #[test]
    fn status_before_any_session_reports_none_found() {
        let dir = temp_project();
        init_project(&dir);

        ralph()
            .current_dir(dir.path())
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("No session found"));
    }

    #[test]
    fn tasks_before_any_plan_reports_no_tasks() {
        let dir = temp_project();
        init_project(&dir);

        ralph()
            .current_dir(dir.path())
            .arg("tasks")
            .assert()
            .success()
            .stdout(predicate::str::contains("No tasks yet"));
    }

    #[test]
    fn history_with_no_sessions_is_empty() {
        let dir = temp_project();
        init_project(&dir);

        ralph()
            .current_dir(dir.path())
            .arg("history")
            .assert()
            .success()
            .stdout(predicate::str::contains("No session history recorded yet"));
    }

    #[test]
    fn memory_with_nothing_recorded_reports_none() {
        let dir = temp_project();
        init_project(&dir);

        ralph()
            .current_dir(dir.path())
            .arg("memory")
            .assert()
            .success()
            .stdout(predicate::str::contains("No memory recorded yet"));
    }
}

mod project_root_flag {
    use super::*;

    #[test]
    fn global_project_root_flag_targets_another_directory() {
        let project = temp_project();
        let cwd = temp_project();
        init_project(&project);

        ralph()
            .current_dir(cwd.path())
            .arg("--project-root")
            .arg(project.path())
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("No session found"));
    }
}

mod operator_controls {
    use super::*;

    #[test]
    fn pause_without_a_session_fails() {
        let dir = temp_project();
        init_project(&dir);

        ralph().current_dir(dir.path()).arg("pause").assert().failure();
    }

    #[test]
    fn inject_rejects_empty_message() {
        let dir = temp_project();
        init_project(&dir);

        ralph()
            .current_dir(dir.path())
            .arg("inject")
            .arg("   ")
            .assert()
            .failure();
    }

    #[test]
    fn inject_accepts_a_message() {
        let dir = temp_project();
        init_project(&dir);

        ralph()
            .current_dir(dir.path())
            .arg("inject")
            .arg("slow down and re-read the plan")
            .assert()
            .success()
            .stdout(predicate::str::contains("Injection recorded"));
    }

    #[test]
    fn skip_on_unknown_task_fails() {
        let dir = temp_project();
        init_project(&dir);

        ralph()
            .current_dir(dir.path())
            .arg("skip")
            .arg("no-such-task")
            .assert()
            .failure();
    }
}

mod maintenance {
    use super::*;

    #[test]
    fn regenerate_plan_succeeds_with_no_prior_plan() {
        let dir = temp_project();
        init_project(&dir);

        ralph()
            .current_dir(dir.path())
            .arg("regenerate-plan")
            .assert()
            .success();
    }

    #[test]
    fn reset_without_a_session_fails() {
        let dir = temp_project();
        init_project(&dir);

        ralph().current_dir(dir.path()).arg("reset").assert().failure();
    }

    #[test]
    fn clean_removes_ralph_directory() {
        let dir = temp_project();
        init_project(&dir);
        assert!(dir.path().join(".ralph").exists());

        ralph().current_dir(dir.path()).arg("clean").assert().success();
        assert!(!dir.path().join(".ralph").exists());
    }

    #[test]
    fn clean_without_init_is_a_no_op() {
        let dir = temp_project();

        ralph().current_dir(dir.path()).arg("clean").assert().success();
    }
}
