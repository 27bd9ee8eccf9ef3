//! Shared demo memos for tests and benchmarks.

pub struct DemoMemo {
    pub content: &'static str,
    pub tags: &'static [&'static str],
    /// Creation time relative to an anchor instant, in seconds (negative = in the past)
    pub offset: i64,
}

const HOUR: i64 = 60 * 60;
const DAY: i64 = 24 * HOUR;

/// 20 memos; the first 15 mention "MCP" somewhere in content or tags.
pub const DEMO_MEMOS: &[DemoMemo] = &[
    // --- MCP work notes ---
    DemoMemo {
        content: "# MCP server rollout\n\n- deploy the memos adapter\n- wire the search tool\n- document the response formats\n\nThe rollout went fine apart from a flaky auth check on staging.",
        tags: &["work", "mcp"],
        offset: -30 * DAY,
    },
    DemoMemo {
        content: "MCP tool ideas: summarize memos, search by tag, archive stale notes",
        tags: &["ideas"],
        offset: -28 * DAY,
    },
    DemoMemo {
        content: "Reading list\n1. the MCP specification\n2. JSON-RPC 2.0\n3. notes on context budgets for agents",
        tags: &["reading"],
        offset: -27 * DAY,
    },
    DemoMemo {
        content: "Pagination for the MCP search tool: default limit 10, hard cap 50, offset based. Return has_more and next_offset so the agent can continue.",
        tags: &["work", "design"],
        offset: -25 * DAY,
    },
    DemoMemo {
        content: "Bug: MCP search returned full memo bodies and blew through the context window. Fix with summary and minimal formats.",
        tags: &["work", "bug"],
        offset: -21 * DAY,
    },
    DemoMemo {
        content: "Standup\n- finished snippet extraction\n- started relevance scoring for mcp search\n- blocked on nothing",
        tags: &["standup"],
        offset: -20 * DAY,
    },
    DemoMemo {
        content: "Snippet windows should center on the densest cluster of matches. Highlights are relative to the window start.",
        tags: &["design", "MCP"],
        offset: -18 * DAY,
    },
    DemoMemo {
        content: "Call with the infra team about hosting the memos instance behind the VPN. MCP clients will need a token.",
        tags: &["meetings"],
        offset: -15 * DAY,
    },
    DemoMemo {
        content: "## Retro\n\n- what went well: mcp adapter shipped\n- what to improve: tests for date filters\n* action: add property tests",
        tags: &["retro", "work"],
        offset: -12 * DAY,
    },
    DemoMemo {
        content: "Tag filter semantics decided: any of the requested tags matches. Written down so nobody argues about it again.",
        tags: &["design", "mcp"],
        offset: -10 * DAY,
    },
    DemoMemo {
        content: "mcp mcp mcp: testing how repeated terms affect the score",
        tags: &["scratch"],
        offset: -9 * DAY,
    },
    DemoMemo {
        content: "Weekly review: the MCP integration is stable, latest memos listing now supports the summary format.",
        tags: &["review"],
        offset: -7 * DAY,
    },
    DemoMemo {
        content: "Timestamps without a timezone are rejected by the MCP search tool. Use 2024-05-01T00:00:00Z style values.",
        tags: &["docs"],
        offset: -5 * DAY,
    },
    DemoMemo {
        content: "Idea: expose a by-tag listing through MCP with an optional format parameter that defaults to full.",
        tags: &["ideas"],
        offset: -3 * DAY,
    },
    DemoMemo {
        content: "Quick note from the train",
        tags: &["mcp"],
        offset: -2 * HOUR,
    },
    // --- Unrelated personal notes ---
    DemoMemo {
        content: "Grocery list: eggs, oat milk, coffee beans, lemons",
        tags: &["home"],
        offset: -29 * DAY,
    },
    DemoMemo {
        content: "quarterly report draft: revenue flat, costs down, hiring paused until next quarter",
        tags: &["work"],
        offset: -16 * DAY,
    },
    DemoMemo {
        content: "Weekend hike: start at the north trailhead, bring water, the ridge path is closed",
        tags: &["personal"],
        offset: -11 * DAY,
    },
    DemoMemo {
        content: "Book club picks\n- The Left Hand of Darkness\n- Piranesi\n- A Memory Called Empire",
        tags: &["personal", "reading"],
        offset: -6 * DAY,
    },
    DemoMemo {
        content: "Dentist appointment moved to Thursday 9am",
        tags: &["home"],
        offset: -DAY,
    },
];

/// Number of memos in `DEMO_MEMOS` that match the query "mcp".
pub const DEMO_MCP_COUNT: usize = 15;
