//! Allocation engine: preconditions, assignee checks and races.

mod common;

use std::sync::{Arc, Barrier};
use std::thread;

use common::{NewJobBuilder, NewUserBuilder, TestHarness};
use jobflow::workflow::AllocationTarget;
use jobflow::{AssigneeKind, Assignment, ErrorKind, JobStatus, Role};

#[test]
fn test_concurrent_allocation_has_one_winner() {
    let h = TestHarness::on_disk();
    let crew = h.crew();
    let second_writer = h.approved_user("Willa", Role::Writer);
    h.ready_job(&crew.marketing.id, "JOB-RACE");

    let barrier = Arc::new(Barrier::new(2));
    let handles: Vec<_> = [crew.writer.id.clone(), second_writer.id.clone()]
        .into_iter()
        .map(|writer| {
            let workflow = h.workflow.clone();
            let barrier = Arc::clone(&barrier);
            let allocator = crew.allocator.id.clone();
            thread::spawn(move || {
                barrier.wait();
                workflow.allocate_job(&allocator, "JOB-RACE", AllocationTarget::Writer(writer))
            })
        })
        .collect();

    let results: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().expect("allocation thread panicked"))
        .collect();

    let winners: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    let losers: Vec<_> = results.iter().filter_map(|r| r.as_ref().err()).collect();
    assert_eq!(winners.len(), 1);
    assert_eq!(losers.len(), 1);
    assert_eq!(losers[0].kind(), ErrorKind::IllegalTransition);

    let job = h.job("JOB-RACE");
    assert_eq!(job.status, JobStatus::Allocated);
    assert_eq!(job.writer(), winners[0].writer());
}

#[test]
fn test_draft_job_is_not_allocatable() {
    let h = TestHarness::new();
    let crew = h.crew();
    h.workflow
        .create_job(&crew.marketing.id, NewJobBuilder::new("JOB-D").draft().build())
        .unwrap();

    let err = h
        .workflow
        .allocate_job(
            &crew.allocator.id,
            "JOB-D",
            AllocationTarget::Writer(crew.writer.id.clone()),
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IllegalTransition);

    let job = h.job("JOB-D");
    assert_eq!(job.status, JobStatus::Draft);
    assert_eq!(job.assignment, Assignment::Unallocated);
}

#[test]
fn test_pending_completion_is_not_allocatable() {
    let h = TestHarness::new();
    let crew = h.crew();
    h.drop_job(&crew.marketing.id, "JOB-P");

    let err = h
        .workflow
        .allocate_job(
            &crew.allocator.id,
            "JOB-P",
            AllocationTarget::Writer(crew.writer.id.clone()),
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IllegalTransition);
}

#[test]
fn test_pending_writer_is_invalid_assignee() {
    let h = TestHarness::new();
    let crew = h.crew();
    let newbie = h
        .workflow
        .register_user(NewUserBuilder::new("Nia").role(Role::Writer).build())
        .unwrap();
    h.ready_job(&crew.marketing.id, "JOB-1");

    let err = h
        .workflow
        .allocate_job(
            &crew.allocator.id,
            "JOB-1",
            AllocationTarget::Writer(newbie.id.clone()),
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidAssignee);

    let job = h.job("JOB-1");
    assert_eq!(job.status, JobStatus::PendingAllocation);
    assert_eq!(job.assignment, Assignment::Unallocated);
}

#[test]
fn test_wrong_role_and_unknown_assignees() {
    let h = TestHarness::new();
    let crew = h.crew();
    h.ready_job(&crew.marketing.id, "JOB-1");

    let err = h
        .workflow
        .allocate_job(
            &crew.allocator.id,
            "JOB-1",
            AllocationTarget::Writer(crew.process.id.clone()),
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidAssignee);

    let err = h
        .workflow
        .allocate_job(
            &crew.allocator.id,
            "JOB-1",
            AllocationTarget::Process(crew.writer.id.clone()),
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidAssignee);

    let err = h
        .workflow
        .allocate_job(
            &crew.allocator.id,
            "JOB-1",
            AllocationTarget::Writer("ghost".into()),
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidAssignee);
}

#[test]
fn test_writer_wins_when_both_supplied() {
    let h = TestHarness::new();
    let crew = h.crew();
    h.ready_job(&crew.marketing.id, "JOB-1");

    let target = AllocationTarget::resolve(
        Some(crew.writer.id.clone()),
        Some(crew.process.id.clone()),
    )
    .unwrap();
    assert_eq!(target.kind(), AssigneeKind::Writer);

    let job = h
        .workflow
        .allocate_job(&crew.allocator.id, "JOB-1", target)
        .unwrap();
    assert_eq!(job.status, JobStatus::Allocated);
    assert_eq!(job.writer(), Some(&crew.writer.id));
    assert!(job.process_user().is_none());
}

#[test]
fn test_reallocation_is_refused() {
    let h = TestHarness::new();
    let crew = h.crew();
    h.allocated_job(&crew.marketing.id, &crew.allocator.id, &crew.writer.id, "JOB-1");

    let err = h
        .workflow
        .allocate_job(
            &crew.allocator.id,
            "JOB-1",
            AllocationTarget::Process(crew.process.id.clone()),
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IllegalTransition);

    let job = h.job("JOB-1");
    assert_eq!(job.writer(), Some(&crew.writer.id));
    assert!(job.process_user().is_none());
}

#[test]
fn test_allocation_requires_allocating_role() {
    let h = TestHarness::new();
    let crew = h.crew();
    let admin = h.approved_user("Ada", Role::Admin);
    h.ready_job(&crew.marketing.id, "JOB-1");
    h.ready_job(&crew.marketing.id, "JOB-2");

    let err = h
        .workflow
        .allocate_job(
            &crew.marketing.id,
            "JOB-1",
            AllocationTarget::Writer(crew.writer.id.clone()),
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);

    h.workflow
        .allocate_job(
            &admin.id,
            "JOB-2",
            AllocationTarget::Writer(crew.writer.id.clone()),
        )
        .unwrap();
}

#[test]
fn test_pending_allocator_cannot_act() {
    let h = TestHarness::new();
    let crew = h.crew();
    let pending_allocator = h
        .workflow
        .register_user(NewUserBuilder::new("Pat").role(Role::Allocator).build())
        .unwrap();
    h.ready_job(&crew.marketing.id, "JOB-1");

    let err = h
        .workflow
        .allocate_job(
            &pending_allocator.id,
            "JOB-1",
            AllocationTarget::Writer(crew.writer.id.clone()),
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
}
