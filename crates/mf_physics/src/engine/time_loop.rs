// crates/mf_physics/src/engine/time_loop.rs

//! 时间循环
//!
//! 驱动 [`SolverState::step`]，按输出间隔把 [`Snapshot`] 视图交给
//! [`SnapshotSink`]。数值错误不在步内捕获，在这里统一记录：写入失败记录、
//! 状态转入 FAILED、尽力写出最终快照，再把错误放进 [`RunReport`] 返回。
//!
//! 快照写入错误不打断数值循环，收集后随报告返回。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::diagnostics::{DiagnosticsRecord, FailureRecord};
use super::state::{SimulationPhase, SolverState};
use crate::error::PhysicsError;
use crate::fields::StaggeredFields;
use crate::grid::Grid;
use mf_foundation::{FlatteningOrder, MfResult};

/// 某一时刻状态的只读视图
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    /// 步数
    pub step: usize,
    /// 时间
    pub time: f64,
    /// 网格
    pub grid: &'a Grid,
    /// 展平顺序
    pub order: FlatteningOrder,
    /// 场
    pub fields: &'a StaggeredFields,
    /// 诊断记录
    pub diagnostics: &'a DiagnosticsRecord,
    /// 阶段
    pub phase: SimulationPhase,
}

impl<'a> Snapshot<'a> {
    /// 当前状态的视图
    pub fn of(state: &'a SolverState) -> Self {
        Self {
            step: state.step_index(),
            time: state.time(),
            grid: state.grid(),
            order: state.mask().order(),
            fields: state.fields(),
            diagnostics: state.diagnostics(),
            phase: state.phase(),
        }
    }
}

/// 快照输出接口
pub trait SnapshotSink {
    /// 写出一次周期快照
    fn write_snapshot(&mut self, snapshot: &Snapshot<'_>) -> MfResult<()>;

    /// 写出最终状态（正常结束与失败时都会调用一次）
    fn write_final(&mut self, snapshot: &Snapshot<'_>) -> MfResult<()>;
}

/// 丢弃所有快照
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl SnapshotSink for NullSink {
    fn write_snapshot(&mut self, _snapshot: &Snapshot<'_>) -> MfResult<()> {
        Ok(())
    }

    fn write_final(&mut self, _snapshot: &Snapshot<'_>) -> MfResult<()> {
        Ok(())
    }
}

/// 运行结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// 到达结束时间
    Completed,
    /// 数值失败
    Failed,
    /// 被停止标志中断
    Stopped,
}

impl RunOutcome {
    /// 名称
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Stopped => "stopped",
        }
    }
}

/// 运行报告
#[derive(Debug, Clone)]
pub struct RunReport {
    /// 结果
    pub outcome: RunOutcome,
    /// 完成的步数
    pub steps: usize,
    /// 结束时间
    pub final_time: f64,
    /// 失败记录
    pub failure: Option<FailureRecord>,
    /// 导致失败的错误
    pub error: Option<PhysicsError>,
    /// 快照写入错误
    pub write_errors: Vec<String>,
}

impl RunReport {
    /// 是否正常结束
    pub fn is_success(&self) -> bool {
        self.outcome == RunOutcome::Completed
    }
}

/// 时间循环
#[derive(Debug, Clone, Default)]
pub struct TimeLoop {
    stop_flag: Option<Arc<AtomicBool>>,
}

impl TimeLoop {
    /// 创建
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置协作式停止标志（每步之间检查）
    pub fn with_stop_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.stop_flag = Some(flag);
        self
    }

    fn stop_requested(&self) -> bool {
        self.stop_flag
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    /// 运行到结束、失败或被停止
    pub fn run(&self, state: &mut SolverState, sink: &mut dyn SnapshotSink) -> RunReport {
        let mut write_errors = Vec::new();
        let interval = state.params().output_interval;

        let outcome = match self.advance(state, sink, interval, &mut write_errors) {
            Ok(outcome) => outcome,
            Err(err) => {
                log::debug!("时间循环在第 {} 步失败: {err}", state.step_index());
                state.mark_failed(&err);
                return self.finish(state, sink, RunOutcome::Failed, Some(err), write_errors);
            }
        };
        self.finish(state, sink, outcome, None, write_errors)
    }

    fn advance(
        &self,
        state: &mut SolverState,
        sink: &mut dyn SnapshotSink,
        interval: usize,
        write_errors: &mut Vec<String>,
    ) -> Result<RunOutcome, PhysicsError> {
        if state.phase() == SimulationPhase::Init {
            state.prepare()?;
        }
        if state.phase() == SimulationPhase::Ready && state.step_index() == 0 {
            record(sink.write_snapshot(&Snapshot::of(state)), write_errors);
        }

        loop {
            if state.is_finished() {
                return Ok(RunOutcome::Completed);
            }
            if self.stop_requested() {
                log::debug!("收到停止请求，在第 {} 步停止", state.step_index());
                state.mark_stopped();
                return Ok(RunOutcome::Stopped);
            }
            state.step()?;
            if state.step_index() % interval == 0 || state.is_finished() {
                record(sink.write_snapshot(&Snapshot::of(state)), write_errors);
            }
        }
    }

    fn finish(
        &self,
        state: &mut SolverState,
        sink: &mut dyn SnapshotSink,
        outcome: RunOutcome,
        error: Option<PhysicsError>,
        mut write_errors: Vec<String>,
    ) -> RunReport {
        record(sink.write_final(&Snapshot::of(state)), &mut write_errors);
        RunReport {
            outcome,
            steps: state.step_index(),
            final_time: state.time(),
            failure: state.diagnostics().failure.clone(),
            error,
            write_errors,
        }
    }
}

fn record(result: MfResult<()>, errors: &mut Vec<String>) {
    if let Err(err) = result {
        log::warn!("快照写入失败: {err}");
        errors.push(err.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mf_config::CaseConfig;
    use mf_foundation::{FailureKind, MfError};

    #[derive(Default)]
    struct Recorder {
        steps: Vec<usize>,
        finals: usize,
        fail_writes: bool,
    }

    impl SnapshotSink for Recorder {
        fn write_snapshot(&mut self, snapshot: &Snapshot<'_>) -> MfResult<()> {
            self.steps.push(snapshot.step);
            if self.fail_writes {
                return Err(MfError::io("磁盘已满"));
            }
            Ok(())
        }

        fn write_final(&mut self, _snapshot: &Snapshot<'_>) -> MfResult<()> {
            self.finals += 1;
            Ok(())
        }
    }

    fn case() -> CaseConfig {
        let mut config = CaseConfig::template(3, 3, 3);
        config.simulation_parameters.time_step = 0.01;
        config.simulation_parameters.total_time = 0.05;
        config.simulation_parameters.output_interval = 2;
        config
    }

    #[test]
    fn test_output_interval_and_final_step() {
        let mut state = SolverState::new(&case()).unwrap();
        let mut sink = Recorder::default();
        let report = TimeLoop::new().run(&mut state, &mut sink);
        assert!(report.is_success());
        assert_eq!(report.steps, 5);
        assert_eq!(sink.steps, vec![0, 2, 4, 5]);
        assert_eq!(sink.finals, 1);
        assert_eq!(state.phase(), SimulationPhase::Done);
    }

    #[test]
    fn test_write_errors_do_not_stop_loop() {
        let mut state = SolverState::new(&case()).unwrap();
        let mut sink = Recorder {
            fail_writes: true,
            ..Recorder::default()
        };
        let report = TimeLoop::new().run(&mut state, &mut sink);
        assert_eq!(report.outcome, RunOutcome::Completed);
        assert_eq!(report.write_errors.len(), 4);
    }

    #[test]
    fn test_stop_flag() {
        let flag = Arc::new(AtomicBool::new(true));
        let mut state = SolverState::new(&case()).unwrap();
        let report = TimeLoop::new()
            .with_stop_flag(flag)
            .run(&mut state, &mut NullSink);
        assert_eq!(report.outcome, RunOutcome::Stopped);
        assert_eq!(report.steps, 0);
        assert_eq!(state.phase(), SimulationPhase::Stopped);
    }

    #[test]
    fn test_failure_is_recorded() {
        let mut config = case();
        config.simulation_parameters.time_step = 1.0;
        config.simulation_parameters.total_time = 5.0;
        config.initial_conditions.initial_velocity = [100.0, 0.0, 0.0];
        let mut state = SolverState::new(&config).unwrap();
        let mut sink = Recorder::default();
        let report = TimeLoop::new().run(&mut state, &mut sink);
        assert_eq!(report.outcome, RunOutcome::Failed);
        assert_eq!(report.steps, 0);
        let failure = report.failure.unwrap();
        assert_eq!(failure.kind, FailureKind::CflViolation);
        assert_eq!(failure.step, 0);
        assert_eq!(sink.finals, 1);
        assert_eq!(state.phase(), SimulationPhase::Failed);
    }
}
